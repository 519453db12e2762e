use std::{future::Future, sync::Arc, time::Duration};

use log::debug;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub type Latest<T> = watch::Receiver<Option<Arc<T>>>;

/// Handle to a background polling task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollHandle<T> {
    token: CancellationToken,
    rx: Latest<T>,
}

impl<T: Send + Sync + 'static> PollHandle<T> {
    /// Calls `fetch` right away, then again `cadence` after each call completes.
    /// Polls never overlap.
    pub fn spawn<F, Fut>(cadence: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send,
    {
        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(None);

        let task_token = token.clone();
        tokio::spawn(async move {
            let poll_loop = async {
                loop {
                    let value = fetch().await;

                    if tx.send(Some(Arc::new(value))).is_err() {
                        break;
                    }

                    tokio::time::sleep(cadence).await;
                }
            };

            tokio::select! {
                _ = task_token.cancelled() => debug!("Poller stopped"),
                _ = poll_loop => debug!("Poller has no listeners left"),
            }
        });

        Self { token, rx }
    }

    pub fn subscribe(&self) -> Latest<T> {
        self.rx.clone()
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Waits up to `timeout` for the first value to be published.
pub async fn first_value<T>(mut rx: Latest<T>, timeout: Duration) -> Option<Arc<T>> {
    let waited = tokio::time::timeout(timeout, rx.wait_for(Option::is_some))
        .await
        .ok()
        .and_then(|res| res.ok().and_then(|val| val.clone()));

    waited.or_else(|| rx.borrow().clone())
}
