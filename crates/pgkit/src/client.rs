//! Client traits and the query execution adapters.
//!
//! [`QueryClient`] has two entry points so that "no parameters" and "an empty
//! parameter list" stay distinguishable all the way down to the driver. For
//! `tokio-postgres` the first goes through the simple query protocol (which
//! accepts multi-statement scripts and returns text cells) and the second
//! through the extended protocol with typed binding.

use crate::error::{PgError, PgResult};
use crate::result::QueryResult;
use crate::stream::{ResultStream, UntilError};
use crate::value::{Row, Value};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::time::Instant;
use tokio_postgres::SimpleQueryMessage;
use tokio_postgres::types::ToSql;

/// Parameters for one statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Params<'a> {
    /// No parameter argument at all.
    Omitted,
    /// Positional values bound to `$1..$n`, possibly none.
    Bound(&'a [Value]),
}

impl Params<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Omitted => 0,
            Self::Bound(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_omitted(&self) -> bool {
        matches!(self, Self::Omitted)
    }
}

impl<'a> From<&'a [Value]> for Params<'a> {
    fn from(values: &'a [Value]) -> Self {
        Self::Bound(values)
    }
}

impl<'a> From<&'a Vec<Value>> for Params<'a> {
    fn from(values: &'a Vec<Value>) -> Self {
        Self::Bound(values)
    }
}

impl<'a> From<Option<&'a [Value]>> for Params<'a> {
    fn from(values: Option<&'a [Value]>) -> Self {
        values.map_or(Self::Omitted, Self::Bound)
    }
}

/// A connection (or transaction) that can run one statement at a time.
pub trait QueryClient: Send + Sync {
    /// Run `sql` without a parameter argument.
    fn query(&self, sql: &str) -> impl std::future::Future<Output = PgResult<QueryResult>> + Send;

    /// Run `sql` with positional parameters.
    fn query_with(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = PgResult<QueryResult>> + Send;
}

/// Clients that can hand back rows incrementally.
pub trait StreamingClient: QueryClient {
    fn query_rows(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = PgResult<ResultStream<'static, Row>>> + Send;
}

fn sql_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn decode_rows(rows: &[tokio_postgres::Row]) -> PgResult<QueryResult> {
    let rows = rows.iter().map(Row::from_pg).collect::<PgResult<Vec<_>>>()?;
    Ok(QueryResult::from_rows(rows))
}

/// Collapse simple-protocol messages into the result of the last statement.
fn last_statement(messages: &[SimpleQueryMessage]) -> PgResult<QueryResult> {
    let mut current = QueryResult::default();
    let mut last = QueryResult::default();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(_) => {
                current.rows.get_or_insert_with(Vec::new);
            }
            SimpleQueryMessage::Row(row) => {
                current
                    .rows
                    .get_or_insert_with(Vec::new)
                    .push(Row::from_simple(row)?);
            }
            SimpleQueryMessage::CommandComplete(n) => {
                current.rows_affected = Some(*n);
                last = std::mem::take(&mut current);
            }
            _ => {}
        }
    }

    Ok(last)
}

impl QueryClient for tokio_postgres::Client {
    async fn query(&self, sql: &str) -> PgResult<QueryResult> {
        let messages = tokio_postgres::Client::simple_query(self, sql)
            .await
            .map_err(PgError::from_db_error)?;
        last_statement(&messages)
    }

    async fn query_with(&self, sql: &str, params: &[Value]) -> PgResult<QueryResult> {
        let rows = tokio_postgres::Client::query(self, sql, &sql_params(params))
            .await
            .map_err(PgError::from_db_error)?;
        decode_rows(&rows)
    }
}

impl QueryClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str) -> PgResult<QueryResult> {
        let messages = tokio_postgres::Transaction::simple_query(self, sql)
            .await
            .map_err(PgError::from_db_error)?;
        last_statement(&messages)
    }

    async fn query_with(&self, sql: &str, params: &[Value]) -> PgResult<QueryResult> {
        let rows = tokio_postgres::Transaction::query(self, sql, &sql_params(params))
            .await
            .map_err(PgError::from_db_error)?;
        decode_rows(&rows)
    }
}

fn map_pg_rows(stream: tokio_postgres::RowStream) -> ResultStream<'static, Row> {
    ResultStream::new(stream.map(|item| {
        item.map_err(PgError::from_db_error)
            .and_then(|row| Row::from_pg(&row))
    }))
}

impl StreamingClient for tokio_postgres::Client {
    async fn query_rows(&self, sql: &str, params: &[Value]) -> PgResult<ResultStream<'static, Row>> {
        let params = sql_params(params);
        let stream = tokio_postgres::Client::query_raw(self, sql, params.iter().copied())
            .await
            .map_err(PgError::from_db_error)?;
        Ok(map_pg_rows(stream))
    }
}

impl StreamingClient for tokio_postgres::Transaction<'_> {
    async fn query_rows(&self, sql: &str, params: &[Value]) -> PgResult<ResultStream<'static, Row>> {
        let params = sql_params(params);
        let stream = tokio_postgres::Transaction::query_raw(self, sql, params.iter().copied())
            .await
            .map_err(PgError::from_db_error)?;
        Ok(map_pg_rows(stream))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl QueryClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str) -> PgResult<QueryResult> {
        QueryClient::query(&**self, sql).await
    }

    async fn query_with(&self, sql: &str, params: &[Value]) -> PgResult<QueryResult> {
        QueryClient::query_with(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl QueryClient for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str) -> PgResult<QueryResult> {
        QueryClient::query(&**self, sql).await
    }

    async fn query_with(&self, sql: &str, params: &[Value]) -> PgResult<QueryResult> {
        QueryClient::query_with(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl QueryClient for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str) -> PgResult<QueryResult> {
        QueryClient::query(&**self, sql).await
    }

    async fn query_with(&self, sql: &str, params: &[Value]) -> PgResult<QueryResult> {
        QueryClient::query_with(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Client {
    async fn query_rows(&self, sql: &str, params: &[Value]) -> PgResult<ResultStream<'static, Row>> {
        StreamingClient::query_rows(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::ClientWrapper {
    async fn query_rows(&self, sql: &str, params: &[Value]) -> PgResult<ResultStream<'static, Row>> {
        StreamingClient::query_rows(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Transaction<'_> {
    async fn query_rows(&self, sql: &str, params: &[Value]) -> PgResult<ResultStream<'static, Row>> {
        StreamingClient::query_rows(&**self, sql, params).await
    }
}

impl<C: QueryClient> QueryClient for &C {
    fn query(&self, sql: &str) -> impl std::future::Future<Output = PgResult<QueryResult>> + Send {
        (*self).query(sql)
    }

    fn query_with(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = PgResult<QueryResult>> + Send {
        (*self).query_with(sql, params)
    }
}

impl<C: StreamingClient> StreamingClient for &C {
    fn query_rows(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = PgResult<ResultStream<'static, Row>>> + Send {
        (*self).query_rows(sql, params)
    }
}

// ===== adapters =====

/// Run one statement, calling the parameterless entry point when `params` is
/// [`Params::Omitted`] and forwarding bound values unchanged otherwise.
pub async fn pg_query<C: QueryClient>(
    client: &C,
    sql: &str,
    params: Params<'_>,
) -> PgResult<QueryResult> {
    let protocol = if params.is_omitted() { "simple" } else { "extended" };
    tracing::debug!(
        target: "pgkit.sql",
        sql = %sql,
        param_count = params.len(),
        protocol,
        "executing query"
    );

    let start = Instant::now();
    let result = match params {
        Params::Omitted => client.query(sql).await,
        Params::Bound(values) => client.query_with(sql, values).await,
    };

    match &result {
        Ok(r) => tracing::debug!(
            target: "pgkit.sql",
            elapsed_ms = start.elapsed().as_millis() as u64,
            rows = r.rows.as_ref().map_or(0, Vec::len),
            "query complete"
        ),
        Err(e) => tracing::warn!(
            target: "pgkit.sql",
            sql = %sql,
            error = %e,
            "query failed"
        ),
    }

    result
}

/// Single-value stream over [`pg_query`]: the result (or error) once, then completion.
pub fn query_once<'a, C: QueryClient>(
    client: &'a C,
    sql: &'a str,
    params: Params<'a>,
) -> ResultStream<'a, QueryResult> {
    ResultStream::new(stream::once(pg_query(client, sql, params)))
}

/// Row-by-row stream over a streaming query.
///
/// Rows are yielded as the driver produces them. The first error (including a
/// failure to start the query) is yielded and ends the stream.
pub fn query_stream<'a, C: StreamingClient>(
    client: &'a C,
    sql: &'a str,
    params: &'a [Value],
) -> ResultStream<'a, Row> {
    tracing::debug!(
        target: "pgkit.sql",
        sql = %sql,
        param_count = params.len(),
        "opening row stream"
    );
    let rows = stream::once(client.query_rows(sql, params)).try_flatten();
    ResultStream::new(UntilError::new(rows))
}
