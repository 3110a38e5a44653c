//! Cancellable sequence of backend chat units

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::LlmError;
use crate::protocol::ollama::ChatResponse;

type UnitResult = Result<ChatResponse, LlmError>;

/// Lazily decoded chat units from one backend call
///
/// A producer task pulls units from the backend into a bounded queue.
/// Producer and consumer share one cancellation token: cancelling it, or
/// dropping the `ChatStream`, stops the producer and drops the backend
/// connection.
///
/// The sequence ends after the first `done` unit, when the backend closes
/// the body, after the first error (delivered exactly once), or on
/// cancellation.
#[derive(Debug)]
pub struct ChatStream {
    rx: mpsc::Receiver<UnitResult>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl ChatStream {
    /// Start draining `source` on a background task
    pub fn spawn<S>(source: S, token: CancellationToken, capacity: usize) -> Self
    where
        S: Stream<Item = UnitResult> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        tokio::spawn(produce(source, tx, token.clone()));

        Self {
            rx,
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    /// Next unit, or `None` once the sequence has ended or was cancelled
    pub async fn next_unit(&mut self) -> Option<UnitResult> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            unit = self.rx.recv() => unit,
        }
    }

    /// Stop the producer and release the backend connection
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

async fn produce<S>(source: S, tx: mpsc::Sender<UnitResult>, token: CancellationToken)
where
    S: Stream<Item = UnitResult> + Send,
{
    let mut source = std::pin::pin!(source);

    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = source.next() => next,
        };

        let Some(item) = next else {
            break;
        };

        let terminal = match &item {
            Ok(unit) => unit.done,
            Err(_) => true,
        };

        tokio::select! {
            biased;
            () = token.cancelled() => break,
            sent = tx.send(item) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        if terminal {
            break;
        }
    }

    tracing::trace!(cancelled = token.is_cancelled(), "backend stream producer finished");
}
