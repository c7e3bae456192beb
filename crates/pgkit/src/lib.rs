//! # pgkit
//!
//! Small building blocks for talking to PostgreSQL through `tokio-postgres`.
//!
//! ## Features
//!
//! - **SQL fragments**: DDL ([`ddl`]) and INSERT ([`insert`]) text with `$n` placeholders
//! - **Input validation**: drop columns a [`TableSchema`] does not declare before they reach SQL
//! - **Query adapters**: run a statement through any [`QueryClient`] as a future or a
//!   single-item [`ResultStream`], or stream rows through a [`StreamingClient`]
//! - **Pool checkout**: one client per [`get_client_from`] stream, released by the caller
//! - **Insert-or-select batches**: reduce per-statement results to generated ids
//! - **Catalog introspection**: tables and columns of the `public` schema
//!
//! ## Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use pgkit::{InsertQuery, PoolConfig, TableSchema, ColumnKind};
//!
//! let pool = pgkit::create_pool_from_config(&PoolConfig::from_env()?)?;
//! let client = pgkit::get_client_from(&pool).next().await.unwrap()?;
//!
//! let schema = TableSchema::new("users").column("name", ColumnKind::String);
//! let input = pgkit::validate_prop_vals_for_input(&schema, &["name", "admin"], vec!["jane", "yes"])?;
//! InsertQuery::from_input("users", input).execute(&*client).await?;
//!
//! client.release();
//! ```
//!
//! Identifiers passed to the SQL builders are interpolated verbatim. Only values
//! are parameterized.

pub mod client;
pub mod compound;
pub mod config;
pub mod ddl;
pub mod error;
pub mod insert;
pub mod introspect;
pub mod pool;
pub mod result;
pub mod schema;
pub mod stream;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Params, QueryClient, StreamingClient, pg_query, query_once, query_stream};
pub use compound::{
    CompoundReducer, create_reduce_compound_insert_or_select_results, insert_or_select_batch,
};
pub use config::{PoolConfig, Recycling};
pub use error::{PgError, PgResult};
pub use insert::{InsertQuery, create_insert_query, insert_or_select_query};
pub use introspect::{
    TableColumn, list_all_columns, list_columns, list_tables, load_table_schema,
};
pub use pool::{Checkout, ConnectionPool, get_client_from};
pub use result::{
    QueryResult, extract_rows, first_query_error, has_query_error, is_valid_result, rows_or_empty,
};
pub use schema::{
    ColumnKind, ColumnSchema, FilteredInput, TableSchema, validate_prop_vals_for_input,
};
pub use stream::{ResultStream, RowEvent, RowEventSender, row_channel};
pub use value::{Row, Value};

#[cfg(feature = "pool")]
pub use pool::{
    create_pool, create_pool_from_config, create_pool_with_config,
    create_pool_with_manager_config,
};

#[cfg(feature = "pool")]
pub use deadpool_postgres::Pool;
