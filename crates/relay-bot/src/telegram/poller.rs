//! Long-polling update source
//!
//! Updates are dispatched on their own tasks. A semaphore caps how many run
//! at once; when the cap is reached the poller stops fetching until a handler
//! finishes. Each update takes its conversation's turn before its task is
//! spawned, so one user's updates are handled in arrival order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relay_service::Dispatcher;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::TelegramClient;

/// Pause after a failed `getUpdates` call
const RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct Poller {
    client: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout_secs: u64,
    concurrency: usize,
}

impl Poller {
    pub fn new(
        client: Arc<TelegramClient>,
        dispatcher: Arc<Dispatcher>,
        poll_timeout_secs: u64,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            dispatcher,
            poll_timeout_secs,
            concurrency: concurrency.max(1),
        }
    }

    /// Poll until `shutdown` resolves, then wait for in-flight handlers
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut offset = 0_i64;
        tokio::pin!(shutdown);

        info!(concurrency = self.concurrency, "Polling for updates");
        loop {
            let batch = tokio::select! {
                () = &mut shutdown => break,
                batch = self.client.get_updates(offset, self.poll_timeout_secs) => batch,
            };

            let updates = match batch {
                Ok(updates) => updates,
                Err(err) if err.is_timeout() => continue,
                Err(err) => {
                    warn!(error = %err, "Fetching updates failed");
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(RETRY_DELAY) => continue,
                    }
                }
            };

            for wire in updates {
                offset = offset.max(wire.update_id + 1);
                let update_id = wire.update_id;
                let Some(update) = wire.into_update() else {
                    debug!(update_id, "Ignoring update kind");
                    continue;
                };

                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                let dispatcher = Arc::clone(&self.dispatcher);
                let turn = dispatcher.enqueue(&update);
                tokio::spawn(async move {
                    let route = dispatcher.dispatch_in_turn(&update, turn).await;
                    debug!(update_id, route = ?route, "Update handled");
                    drop(permit);
                });
            }
        }

        info!("Waiting for in-flight updates");
        // Every permit back in the pool means every handler has finished
        let total = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
        if permits.acquire_many(total).await.is_ok() {
            info!("All updates handled");
        }
    }
}
