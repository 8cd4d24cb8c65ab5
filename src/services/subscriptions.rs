// Live snapshots of Firestore data
//
// Firestore's REST surface has no push channel, so a subscription is a
// polling task feeding a channel. The task is owned by the `Subscription`
// and aborted when it is dropped.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Snapshots buffered between the poller and a slow consumer
const CHANNEL_CAPACITY: usize = 8;

/// Stream of snapshots; polling stops when this is dropped
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T> {
    pub fn unsubscribe(self) {
        // Drop aborts the task
    }

    pub async fn next_snapshot(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

/// Poll `fetch` every `interval` and emit each snapshot that differs from the
/// previous one. The first successful fetch is always emitted. Fetch errors
/// are logged and skipped.
pub fn watch<T, F, Fut>(interval: Duration, mut fetch: F) -> Subscription<T>
where
    T: PartialEq + Clone + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last: Option<T> = None;

        loop {
            ticker.tick().await;

            let snapshot = match fetch().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!("Subscription fetch failed: {}", e);
                    continue;
                }
            };

            if last.as_ref() == Some(&snapshot) {
                continue;
            }

            if tx.send(snapshot.clone()).await.is_err() {
                // Receiver gone
                break;
            }
            last = Some(snapshot);
        }
    });

    Subscription { rx, task }
}
