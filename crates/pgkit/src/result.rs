//! Query results and the predicates used to classify them.

use crate::error::{PgError, PgResult};
use crate::value::Row;

/// The outcome of one statement.
///
/// `rows` is `None` when the statement produced no row description at all
/// (DDL and other commands sent through the simple protocol).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Option<Vec<Row>>,
    pub rows_affected: Option<u64>,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Some(rows),
            rows_affected: None,
        }
    }

    /// A result with no row set, only a command completion count.
    pub fn command(rows_affected: u64) -> Self {
        Self {
            rows: None,
            rows_affected: Some(rows_affected),
        }
    }
}

/// `true` iff the result exists, carries a row set, and that set has at least one row.
pub fn is_valid_result(result: Option<&QueryResult>) -> bool {
    result
        .and_then(|r| r.rows.as_ref())
        .is_some_and(|rows| !rows.is_empty())
}

/// Fold step locating the first empty element of a batch.
///
/// `None` means "no error found yet". Once an index is found it is carried
/// through unchanged.
pub fn has_query_error<T>(state: Option<usize>, element: &[T], index: usize) -> Option<usize> {
    match state {
        Some(found) => Some(found),
        None if element.is_empty() => Some(index),
        None => None,
    }
}

/// Index of the first empty per-statement result, if any.
pub fn first_query_error<T, E>(elements: &[E]) -> Option<usize>
where
    E: AsRef<[T]>,
{
    elements
        .iter()
        .enumerate()
        .fold(None, |state, (index, element)| {
            has_query_error(state, element.as_ref(), index)
        })
}

/// Take the rows of a valid result.
///
/// Fails with [`PgError::InvalidResult`] when the row set is absent or empty.
pub fn extract_rows(result: QueryResult) -> PgResult<Vec<Row>> {
    match result.rows {
        Some(rows) if !rows.is_empty() => Ok(rows),
        Some(_) => Err(PgError::invalid_result("query returned no rows")),
        None => Err(PgError::invalid_result("query returned no row set")),
    }
}

/// Take whatever rows a result has, treating an absent row set as empty.
pub fn rows_or_empty(result: QueryResult) -> Vec<Row> {
    result.rows.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_row() -> QueryResult {
        QueryResult::from_rows(vec![Row::new()])
    }

    #[test]
    fn validity() {
        assert!(!is_valid_result(None));
        assert!(!is_valid_result(Some(&QueryResult::default())));
        assert!(!is_valid_result(Some(&QueryResult::command(0))));
        assert!(!is_valid_result(Some(&QueryResult::from_rows(vec![]))));
        assert!(is_valid_result(Some(&one_row())));
    }

    #[test]
    fn has_query_error_short_circuits() {
        let empty: [Row; 0] = [];
        assert_eq!(has_query_error(Some(0), &empty, 7), Some(0));
        assert_eq!(has_query_error(None, &empty, 7), Some(7));
        assert_eq!(has_query_error(None, &[Row::new()], 7), None);
    }

    #[test]
    fn first_query_error_finds_first_empty() {
        let batch = vec![vec![Row::new()], vec![], vec![]];
        assert_eq!(first_query_error::<Row, _>(&batch), Some(1));

        let ok = vec![vec![Row::new()], vec![Row::new()]];
        assert_eq!(first_query_error::<Row, _>(&ok), None);

        let nothing: Vec<Vec<Row>> = Vec::new();
        assert_eq!(first_query_error::<Row, _>(&nothing), None);
    }

    #[test]
    fn extract_rows_requires_rows() {
        assert!(extract_rows(QueryResult::default()).unwrap_err().is_invalid_result());
        assert!(
            extract_rows(QueryResult::from_rows(vec![]))
                .unwrap_err()
                .is_invalid_result()
        );
        assert_eq!(extract_rows(one_row()).unwrap().len(), 1);
    }

    #[test]
    fn rows_or_empty_accepts_commands() {
        assert!(rows_or_empty(QueryResult::command(0)).is_empty());
        assert_eq!(rows_or_empty(one_row()).len(), 1);
    }
}
