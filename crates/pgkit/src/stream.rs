//! Asynchronous result streams.
//!
//! Every adapter in this crate hands results back as a [`ResultStream`]: a
//! type-erased `Stream<Item = PgResult<T>>`. Single-value adapters yield one
//! item and complete; row streams yield one item per row.

use crate::error::{PgError, PgResult};
use crate::value::Row;
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A boxed stream of fallible results.
#[must_use]
pub struct ResultStream<'a, T> {
    inner: Pin<Box<dyn Stream<Item = PgResult<T>> + Send + 'a>>,
}

impl<'a, T> ResultStream<'a, T> {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = PgResult<T>> + Send + 'a,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<T> Stream for ResultStream<'_, T> {
    type Item = PgResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Ends a stream right after its first error.
pub(crate) struct UntilError<S> {
    inner: Pin<Box<S>>,
    terminated: bool,
}

impl<S> UntilError<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
            terminated: false,
        }
    }
}

impl<S, T> Stream for UntilError<S>
where
    S: Stream<Item = PgResult<T>>,
{
    type Item = PgResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(e))) => {
                self.terminated = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// An event from a push-based row source.
#[derive(Debug)]
pub enum RowEvent {
    Row(Row),
    Error(PgError),
    End,
}

/// Producer half of [`row_channel`].
#[derive(Debug, Clone)]
pub struct RowEventSender {
    tx: mpsc::Sender<RowEvent>,
}

impl RowEventSender {
    /// Push one event. Returns `false` once the consuming stream is gone.
    pub async fn send(&self, event: RowEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn row(&self, row: Row) -> bool {
        self.send(RowEvent::Row(row)).await
    }

    pub async fn error(&self, err: PgError) -> bool {
        self.send(RowEvent::Error(err)).await
    }

    pub async fn end(&self) -> bool {
        self.send(RowEvent::End).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct RowEventStream {
    rx: mpsc::Receiver<RowEvent>,
    finished: bool,
}

impl Stream for RowEventStream {
    type Item = PgResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(RowEvent::Row(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(RowEvent::Error(e))) => {
                self.finished = true;
                self.rx.close();
                Poll::Ready(Some(Err(e)))
            }
            // A dropped sender ends the stream the same way `End` does.
            Poll::Ready(Some(RowEvent::End)) | Poll::Ready(None) => {
                self.finished = true;
                self.rx.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bridge a push-based `row` / `error` / `end` source into a [`ResultStream`].
///
/// Rows are yielded in the order they were sent. The first `Error` is yielded
/// and then the stream completes; `End` (or dropping every sender) completes it.
/// `capacity` bounds how many undelivered events the producer may queue.
pub fn row_channel(capacity: usize) -> (RowEventSender, ResultStream<'static, Row>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let stream = RowEventStream {
        rx,
        finished: false,
    };
    (RowEventSender { tx }, ResultStream::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn row(id: i64) -> Row {
        Row::new().with("id", id)
    }

    #[tokio::test]
    async fn rows_then_end() {
        let (tx, mut stream) = row_channel(8);
        tx.row(row(1)).await;
        tx.row(row(2)).await;
        tx.end().await;

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.get("id").and_then(|v| v.as_i64()), Some(1));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.get("id").and_then(|v| v.as_i64()), Some(2));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn error_stops_the_stream() {
        let (tx, mut stream) = row_channel(8);
        tx.row(row(1)).await;
        tx.error(PgError::Other("boom".into())).await;

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(stream.next().await.is_none());
        assert!(!tx.row(row(2)).await);
    }

    #[tokio::test]
    async fn dropped_sender_completes() {
        let (tx, mut stream) = row_channel(1);
        drop(tx);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn until_error_fuses() {
        let items = vec![
            Ok(1),
            Err(PgError::Other("first".into())),
            Ok(2),
            Err(PgError::Other("second".into())),
        ];
        let collected: Vec<_> = UntilError::new(futures_util::stream::iter(items))
            .collect()
            .await;
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_err());
    }
}
