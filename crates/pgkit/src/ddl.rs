//! DDL fragment builders.
//!
//! Every builder interpolates its arguments verbatim. Identifiers are **not**
//! quoted or escaped, so callers must only pass trusted table/column names;
//! values never belong here (bind them as parameters instead).
//!
//! # Example
//!
//! ```rust
//! use pgkit::ddl;
//!
//! let sql = ddl::create_table_sql(
//!     "members",
//!     &[
//!         "id serial".to_string(),
//!         format!("name {} NOT NULL", ddl::var_char(64)),
//!         format!("team_id integer {}", ddl::foreign_key("teams", "id")),
//!         ddl::primary_key(&["id"]),
//!     ],
//! );
//! assert_eq!(
//!     sql,
//!     "CREATE TABLE members (id serial, name varchar(64) NOT NULL, \
//!      team_id integer REFERENCES teams (id), PRIMARY KEY(id));"
//! );
//! ```

use crate::client::{Params, QueryClient, pg_query};
use crate::error::{PgError, PgResult};
use crate::result::rows_or_empty;
use crate::value::Row;

pub(crate) fn join<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `varchar(<size>)`
pub fn var_char(size: usize) -> String {
    format!("varchar({size})")
}

/// `REFERENCES <table> (<key>)`
pub fn foreign_key(table: &str, key: &str) -> String {
    format!("REFERENCES {table} ({key})")
}

/// `UNIQUE(<c1, c2, ...>)`
pub fn unique<S: AsRef<str>>(columns: &[S]) -> String {
    format!("UNIQUE({})", join(columns))
}

/// `PRIMARY KEY(<c1, c2, ...>)`
pub fn primary_key<S: AsRef<str>>(columns: &[S]) -> String {
    format!("PRIMARY KEY({})", join(columns))
}

/// `FOREIGN KEY (<cols>) REFERENCES <other_table> (<refs>)`
///
/// `columns` and `references` are paired by position.
pub fn foreign_key_composite<S: AsRef<str>, R: AsRef<str>>(
    columns: &[S],
    references: &[R],
    other_table: &str,
) -> PgResult<String> {
    if columns.len() != references.len() {
        return Err(PgError::mismatch(
            "foreign key columns/references",
            columns.len(),
            references.len(),
        ));
    }
    Ok(format!(
        "FOREIGN KEY ({}) REFERENCES {other_table} ({})",
        join(columns),
        join(references)
    ))
}

/// `ALTER TABLE <table>`
pub fn alter_table(table: &str) -> String {
    format!("ALTER TABLE {table}")
}

/// `ALTER TABLE <table> ADD COLUMN`
pub fn add_column(table: &str) -> String {
    format!("{} ADD COLUMN", alter_table(table))
}

/// `ALTER TABLE <table> ALTER COLUMN <column>`
pub fn alter_column(table: &str, column: &str) -> String {
    format!("{} ALTER COLUMN {column}", alter_table(table))
}

/// `ALTER TABLE <table> ALTER COLUMN <column> DROP NOT NULL`
pub fn set_null(table: &str, column: &str) -> String {
    format!("{} DROP NOT NULL", alter_column(table, column))
}

/// `ALTER TABLE <table> ALTER COLUMN <column> SET NOT NULL`
pub fn set_not_null(table: &str, column: &str) -> String {
    format!("{} SET NOT NULL", alter_column(table, column))
}

/// `CREATE TABLE <table> (<f1>, <f2>, ...);` with each fragment trimmed.
pub fn create_table_sql<S: AsRef<str>>(table: &str, columns_and_constraints: &[S]) -> String {
    let body = columns_and_constraints
        .iter()
        .map(|f| f.as_ref().trim())
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {table} ({body});")
}

/// Build and run a `CREATE TABLE` statement.
///
/// The statement is sent without a parameter argument. DDL produces no row
/// set, so the returned rows are normally empty.
pub async fn create_table<C: QueryClient, S: AsRef<str>>(
    client: &C,
    table: &str,
    columns_and_constraints: &[S],
) -> PgResult<Vec<Row>> {
    let sql = create_table_sql(table, columns_and_constraints);
    tracing::info!(target: "pgkit.ddl", table, "creating table");
    let result = pg_query(client, &sql, Params::Omitted).await?;
    Ok(rows_or_empty(result))
}
