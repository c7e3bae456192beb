//! Catalog queries against `information_schema`, scoped to the `public` schema.
//!
//! Each query is bound to one database via `table_catalog = $1`. An empty
//! answer is an [`PgError::InvalidResult`], so a misspelt database or table
//! name fails loudly instead of looking like an empty schema.

use crate::client::{Params, QueryClient, pg_query};
use crate::error::{PgError, PgResult};
use crate::result::extract_rows;
use crate::schema::{ColumnKind, TableSchema};
use crate::value::{Row, Value};
use serde::Serialize;

pub const LIST_TABLES_SQL: &str = "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public' AND table_type = 'BASE TABLE' AND table_catalog = $1 ORDER BY table_type, table_name";

pub const LIST_COLUMNS_SQL: &str = "SELECT column_name FROM information_schema.columns WHERE table_schema = 'public' AND table_catalog = $1 AND table_name = $2";

pub const LIST_ALL_COLUMNS_SQL: &str = "SELECT column_name, table_name, data_type, character_maximum_length, is_nullable, numeric_precision FROM information_schema.columns WHERE table_schema = 'public' AND table_catalog = $1";

/// Base tables of `db_name`, one `table_name` row each, ordered by name.
pub async fn list_tables<C: QueryClient>(db_name: &str, client: &C) -> PgResult<Vec<Row>> {
    let params = [Value::from(db_name)];
    extract_rows(pg_query(client, LIST_TABLES_SQL, Params::Bound(&params)).await?)
}

/// Columns of one table, one `column_name` row each.
pub async fn list_columns<C: QueryClient>(
    db_name: &str,
    client: &C,
    table_name: &str,
) -> PgResult<Vec<Row>> {
    let params = [Value::from(db_name), Value::from(table_name)];
    extract_rows(pg_query(client, LIST_COLUMNS_SQL, Params::Bound(&params)).await?)
}

/// Every column of every table in the database.
pub async fn list_all_columns<C: QueryClient>(db_name: &str, client: &C) -> PgResult<Vec<Row>> {
    let params = [Value::from(db_name)];
    extract_rows(pg_query(client, LIST_ALL_COLUMNS_SQL, Params::Bound(&params)).await?)
}

/// A typed [`list_all_columns`] row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    pub column: String,
    pub table: String,
    pub data_type: String,
    pub max_length: Option<i64>,
    pub nullable: bool,
    pub numeric_precision: Option<i64>,
}

impl TableColumn {
    pub fn from_row(row: &Row) -> PgResult<Self> {
        Ok(Self {
            column: text(row, "column_name")?,
            table: text(row, "table_name")?,
            data_type: text(row, "data_type")?,
            max_length: int(row, "character_maximum_length")?,
            nullable: text(row, "is_nullable")?.eq_ignore_ascii_case("YES"),
            numeric_precision: int(row, "numeric_precision")?,
        })
    }

    pub fn from_rows(rows: &[Row]) -> PgResult<Vec<Self>> {
        rows.iter().map(Self::from_row).collect()
    }

    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_tag(&self.data_type)
    }
}

fn text(row: &Row, column: &str) -> PgResult<String> {
    match row.try_get(column)? {
        Value::Text(s) => Ok(s.clone()),
        other => Err(PgError::decode(column, format!("expected text, got {other:?}"))),
    }
}

// Integers arrive typed over the extended protocol and as text over the simple one.
fn int(row: &Row, column: &str) -> PgResult<Option<i64>> {
    match row.try_get(column)? {
        Value::Null => Ok(None),
        Value::Int(n) => Ok(Some(*n)),
        Value::Text(s) => s
            .parse()
            .map(Some)
            .map_err(|e| PgError::decode(column, format!("invalid integer '{s}': {e}"))),
        other => Err(PgError::decode(column, format!("expected integer, got {other:?}"))),
    }
}

/// Build a [`TableSchema`] for `table_name` from the live catalog.
pub async fn load_table_schema<C: QueryClient>(
    db_name: &str,
    client: &C,
    table_name: &str,
) -> PgResult<TableSchema> {
    let columns = TableColumn::from_rows(&list_all_columns(db_name, client).await?)?;

    let mut schema = TableSchema::new(table_name);
    for column in columns.iter().filter(|c| c.table == table_name) {
        schema.add_column(column.column.as_str(), column.kind());
    }

    if schema.is_empty() {
        return Err(PgError::invalid_result(format!(
            "table '{table_name}' not found in database '{db_name}'"
        )));
    }
    tracing::debug!(
        target: "pgkit.schema",
        table = table_name,
        columns = schema.len(),
        "loaded table schema"
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockClient};

    fn column(name: &str, table: &str, data_type: &str) -> Row {
        Row::new()
            .with("column_name", name)
            .with("table_name", table)
            .with("data_type", data_type)
            .with("character_maximum_length", Value::Null)
            .with("is_nullable", "YES")
            .with("numeric_precision", Value::Null)
    }

    #[tokio::test]
    async fn list_tables_binds_database_name() {
        let client = MockClient::new().respond_rows(vec![Row::new().with("table_name", "users")]);

        let rows = list_tables("app", &client).await.unwrap();

        assert_eq!(rows[0].get("table_name"), Some(&Value::from("users")));
        assert_eq!(
            client.calls(),
            vec![Call::QueryWith(
                "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public' AND table_type = 'BASE TABLE' AND table_catalog = $1 ORDER BY table_type, table_name".to_string(),
                vec![Value::from("app")],
            )]
        );
    }

    #[tokio::test]
    async fn list_columns_binds_database_then_table() {
        let client = MockClient::new().respond_rows(vec![Row::new().with("column_name", "id")]);

        list_columns("app", &client, "users").await.unwrap();

        assert_eq!(
            client.calls(),
            vec![Call::QueryWith(
                LIST_COLUMNS_SQL.to_string(),
                vec![Value::from("app"), Value::from("users")],
            )]
        );
        assert!(LIST_COLUMNS_SQL.ends_with("AND table_catalog = $1 AND table_name = $2"));
    }

    #[tokio::test]
    async fn empty_catalog_answer_is_invalid() {
        let client = MockClient::new();
        let err = list_all_columns("nope", &client).await.unwrap_err();
        assert!(err.is_invalid_result());
    }

    #[tokio::test]
    async fn driver_error_is_propagated() {
        let client = MockClient::new().respond(Err(PgError::Other("connection reset".into())));
        let err = list_tables("app", &client).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn table_column_from_row() {
        let row = Row::new()
            .with("column_name", "name")
            .with("table_name", "users")
            .with("data_type", "character varying")
            .with("character_maximum_length", 64)
            .with("is_nullable", "NO")
            .with("numeric_precision", "32");

        let col = TableColumn::from_row(&row).unwrap();
        assert_eq!(col.column, "name");
        assert_eq!(col.max_length, Some(64));
        assert!(!col.nullable);
        assert_eq!(col.numeric_precision, Some(32));
        assert_eq!(col.kind(), ColumnKind::String);
    }

    #[test]
    fn table_column_requires_fields() {
        let err = TableColumn::from_row(&Row::new().with("column_name", "id")).unwrap_err();
        assert!(matches!(err, PgError::Decode { ref column, .. } if column == "table_name"));
    }

    #[tokio::test]
    async fn load_table_schema_keeps_only_the_table() {
        let client = MockClient::new().respond_rows(vec![
            column("id", "users", "integer"),
            column("title", "posts", "text"),
            column("name", "users", "text"),
        ]);

        let schema = load_table_schema("app", &client, "users").await.unwrap();

        assert_eq!(schema.name, "users");
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(schema.get("id").unwrap().kind, ColumnKind::Integer);
    }

    #[tokio::test]
    async fn load_table_schema_unknown_table() {
        let client = MockClient::new().respond_rows(vec![column("title", "posts", "text")]);
        let err = load_table_schema("app", &client, "users").await.unwrap_err();
        assert!(err.is_invalid_result());
    }
}
