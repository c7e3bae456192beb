//! INSERT statement builders.
//!
//! Values are always bound as `$n` parameters; table and column names are
//! interpolated verbatim and must come from trusted input (see
//! [`validate_prop_vals_for_input`](crate::validate_prop_vals_for_input)).

use crate::client::{Params, QueryClient, pg_query};
use crate::ddl::join;
use crate::error::PgResult;
use crate::result::QueryResult;
use crate::schema::FilteredInput;
use crate::value::Value;

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT INTO <table> (<c1>, <c2>, ...) VALUES ($1, $2, ...)`
///
/// One placeholder per value, numbered from 1 in column order. `values` is
/// only counted here; bind the same values, in the same order, at execution.
pub fn create_insert_query<S: AsRef<str>, V>(table: &str, columns: &[S], values: &[V]) -> String {
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        join(columns),
        placeholders(values.len())
    )
}

/// Insert a row unless it already exists, then return its id either way.
///
/// ```text
/// WITH ins AS (INSERT INTO t (a, b) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING id)
/// SELECT id FROM ins UNION ALL SELECT id FROM t WHERE a = $1 AND b = $2 LIMIT 1
/// ```
///
/// The lookup compares with `=`, so a `NULL` value never matches an existing row.
/// The id is always exposed under the name `id`.
pub fn insert_or_select_query<S: AsRef<str>>(table: &str, columns: &[S], id_column: &str) -> String {
    let returning = if id_column == "id" {
        "id".to_string()
    } else {
        format!("{id_column} AS id")
    };
    let matches = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", c.as_ref(), i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "WITH ins AS ({} ON CONFLICT DO NOTHING RETURNING {returning}) \
         SELECT id FROM ins UNION ALL SELECT {returning} FROM {table} WHERE {matches} LIMIT 1",
        create_insert_query(table, columns, columns),
    )
}

/// INSERT builder that keeps columns and bound values together.
///
/// # Example
///
/// ```rust
/// use pgkit::InsertQuery;
///
/// let mut insert = InsertQuery::new("users");
/// insert.set("name", "jane").set("rank", "major").returning(&["id"]);
/// assert_eq!(
///     insert.to_sql(),
///     "INSERT INTO users (name, rank) VALUES ($1, $2) RETURNING id"
/// );
/// assert_eq!(insert.params().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    returning_cols: Vec<String>,
}

impl InsertQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
            returning_cols: Vec::new(),
        }
    }

    /// Build from validated input.
    pub fn from_input<V: Into<Value>>(table: &str, input: FilteredInput<V>) -> Self {
        Self {
            table: table.to_string(),
            columns: input.cols,
            values: input.vals.into_iter().map(Into::into).collect(),
            returning_cols: Vec::new(),
        }
    }

    /// Set a column value.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(&mut self, column: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.set(column, v);
        }
        self
    }

    /// Set RETURNING columns.
    pub fn returning<S: AsRef<str>>(&mut self, cols: &[S]) -> &mut Self {
        self.returning_cols = cols.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn params(&self) -> &[Value] {
        &self.values
    }

    pub fn to_sql(&self) -> String {
        let mut sql = create_insert_query(&self.table, &self.columns, &self.values);
        if !self.returning_cols.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&join(&self.returning_cols));
        }
        sql
    }

    /// The insert-or-select form of this insert; RETURNING columns are ignored.
    pub fn to_insert_or_select_sql(&self, id_column: &str) -> String {
        insert_or_select_query(&self.table, &self.columns, id_column)
    }

    pub async fn execute<C: QueryClient>(&self, client: &C) -> PgResult<QueryResult> {
        pg_query(client, &self.to_sql(), Params::Bound(&self.values)).await
    }
}
