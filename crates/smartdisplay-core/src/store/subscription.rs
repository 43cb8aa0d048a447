// ── Change subscriptions ──

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use super::state::StateChange;

/// Receives one [`StateChange`] per merge.
///
/// A slow subscriber that falls behind skips the missed notifications
/// (logged at `warn`) and resumes with the oldest one still buffered.
pub struct StateSubscription {
    receiver: broadcast::Receiver<Arc<StateChange>>,
}

impl StateSubscription {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<StateChange>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next change. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Arc<StateChange>> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "state subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<Arc<StateChange>> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => return Some(change),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "state subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> StateChangeStream {
        StateChangeStream {
            inner: BroadcastStream::new(self.receiver),
        }
    }
}

/// `Stream` of state changes; lagged gaps are skipped.
pub struct StateChangeStream {
    inner: BroadcastStream<Arc<StateChange>>,
}

impl Stream for StateChangeStream {
    type Item = Arc<StateChange>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(change))) => return Poll::Ready(Some(change)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "state stream lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
