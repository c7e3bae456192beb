//! In-memory clients for unit tests.

use crate::client::{QueryClient, StreamingClient};
use crate::error::{PgError, PgResult};
use crate::result::QueryResult;
use crate::stream::{ResultStream, RowEvent, row_channel};
use crate::value::{Row, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Query(String),
    QueryWith(String, Vec<Value>),
}

/// Records every call and answers from a queue of canned results.
///
/// With an empty queue each call yields an empty row set.
#[derive(Debug, Default)]
pub(crate) struct MockClient {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<PgResult<QueryResult>>>,
    events: Mutex<Vec<RowEvent>>,
    open_error: Mutex<Option<PgError>>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, response: PgResult<QueryResult>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn respond_rows(self, rows: Vec<Row>) -> Self {
        self.respond(Ok(QueryResult::from_rows(rows)))
    }

    pub(crate) fn stream_events(self, events: Vec<RowEvent>) -> Self {
        *self.events.lock().unwrap() = events;
        self
    }

    pub(crate) fn fail_stream_open(self, err: PgError) -> Self {
        *self.open_error.lock().unwrap() = Some(err);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> PgResult<QueryResult> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::from_rows(Vec::new())))
    }
}

impl QueryClient for MockClient {
    async fn query(&self, sql: &str) -> PgResult<QueryResult> {
        self.record(Call::Query(sql.to_string()))
    }

    async fn query_with(&self, sql: &str, params: &[Value]) -> PgResult<QueryResult> {
        self.record(Call::QueryWith(sql.to_string(), params.to_vec()))
    }
}

impl StreamingClient for MockClient {
    async fn query_rows(&self, sql: &str, params: &[Value]) -> PgResult<ResultStream<'static, Row>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::QueryWith(sql.to_string(), params.to_vec()));

        let open_error = self.open_error.lock().unwrap().take();
        if let Some(err) = open_error {
            return Err(err);
        }

        let events = std::mem::take(&mut *self.events.lock().unwrap());
        let (tx, stream) = row_channel(events.len() + 1);
        for event in events {
            tx.send(event).await;
        }
        Ok(stream)
    }
}
