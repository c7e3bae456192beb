//! Insert-or-select batches and the reducer that turns their results into ids.

use crate::client::{Params, QueryClient, pg_query};
use crate::error::{PgError, PgResult};
use crate::insert::InsertQuery;
use crate::result::{first_query_error, rows_or_empty};
use crate::value::{Row, Value};

/// Reduces the per-statement results of an insert-or-select batch to one id each.
///
/// `id_columns` only names the failing statement in [`PgError::Batch`]; it may
/// be shorter than the batch.
#[derive(Debug, Clone, Default)]
pub struct CompoundReducer {
    id_columns: Vec<String>,
}

impl CompoundReducer {
    pub fn new<S: AsRef<str>>(id_columns: &[S]) -> Self {
        Self {
            id_columns: id_columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn id_columns(&self) -> &[String] {
        &self.id_columns
    }

    /// The `id` of the first row of every statement, in batch order.
    ///
    /// The first statement that returned no rows fails the whole batch.
    pub fn reduce(&self, results: &[Vec<Row>]) -> PgResult<Vec<Value>> {
        if let Some(index) = first_query_error::<Row, _>(results) {
            return Err(PgError::Batch {
                index,
                column: self.id_columns.get(index).cloned(),
            });
        }

        results
            .iter()
            .map(|rows| match rows.first() {
                Some(row) => row.try_get("id").cloned(),
                None => Err(PgError::invalid_result("statement returned no rows")),
            })
            .collect()
    }
}

/// [`CompoundReducer::reduce`] as a closure over `id_columns`.
pub fn create_reduce_compound_insert_or_select_results<S: AsRef<str>>(
    id_columns: &[S],
) -> impl Fn(&[Vec<Row>]) -> PgResult<Vec<Value>> + Send + Sync + 'static {
    let reducer = CompoundReducer::new(id_columns);
    move |results: &[Vec<Row>]| reducer.reduce(results)
}

/// Run each insert as an insert-or-select, in order, and collect the ids.
///
/// `id_columns[i]` is the id column of `inserts[i]`.
pub async fn insert_or_select_batch<C, S>(
    client: &C,
    inserts: &[InsertQuery],
    id_columns: &[S],
) -> PgResult<Vec<Value>>
where
    C: QueryClient,
    S: AsRef<str>,
{
    if inserts.len() != id_columns.len() {
        return Err(PgError::mismatch(
            "batch inserts/id columns",
            inserts.len(),
            id_columns.len(),
        ));
    }

    let mut results = Vec::with_capacity(inserts.len());
    for (insert, id_column) in inserts.iter().zip(id_columns) {
        let sql = insert.to_insert_or_select_sql(id_column.as_ref());
        let result = pg_query(client, &sql, Params::Bound(insert.params())).await?;
        results.push(rows_or_empty(result));
    }

    CompoundReducer::new(id_columns).reduce(&results)
}
