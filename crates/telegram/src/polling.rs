use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::api::Update;
use crate::events::{EventContext, UpdateDispatcher};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("could not decode bot api payload: {0}")]
    Decode(String),
    #[error("bot api `{method}` rejected the request ({code:?}): {description}")]
    Api { method: &'static str, code: Option<i64>, description: String },
}

#[derive(Debug, Error)]
pub enum PollingError {
    #[error("giving up after {attempts} consecutive transport failures: {last}")]
    RetriesExhausted { attempts: u32, last: TransportError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 8, base_delay_ms: 500, max_delay_ms: 30_000 }
    }
}

impl ReconnectPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Source of inbound updates. Telegram acknowledges an update by polling
/// with an offset past it.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn prepare(&self) -> Result<(), TransportError>;
    /// `Ok(None)` means the source is closed for good.
    async fn poll(&self, offset: Option<i64>) -> Result<Option<Vec<Update>>, TransportError>;
}

pub struct PollingRunner {
    transport: Arc<dyn UpdateTransport>,
    dispatcher: Arc<UpdateDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

impl PollingRunner {
    pub fn new(
        transport: Arc<dyn UpdateTransport>,
        dispatcher: Arc<UpdateDispatcher>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    /// Polls until the transport closes. Consecutive transport failures back
    /// off exponentially; a successful poll resets the count.
    ///
    /// Updates of one chat are handled strictly in arrival order, while
    /// different chats proceed concurrently.
    pub async fn start(&self) -> Result<(), PollingError> {
        let mut in_flight = JoinSet::new();
        let mut lanes = ChatLanes::default();
        let mut offset = None;
        let mut failures = 0_u32;
        let mut prepared = false;

        loop {
            while in_flight.try_join_next().is_some() {}
            lanes.prune();

            let outcome = if prepared {
                self.transport.poll(offset).await
            } else {
                self.transport.prepare().await.map(|()| {
                    prepared = true;
                    info!(event_name = "ingress.telegram.ready", "long polling started");
                    Some(Vec::new())
                })
            };

            let updates = match outcome {
                Ok(Some(updates)) => {
                    failures = 0;
                    updates
                }
                Ok(None) => {
                    info!(event_name = "ingress.telegram.closed", "update source closed");
                    break;
                }
                Err(error) => {
                    failures += 1;
                    warn!(
                        attempt = failures,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %error,
                        "telegram transport failed"
                    );
                    if failures > self.reconnect_policy.max_retries {
                        drain(&mut in_flight).await;
                        return Err(PollingError::RetriesExhausted { attempts: failures, last: error });
                    }

                    let delay = self.reconnect_policy.backoff(failures - 1);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
            };

            for update in updates {
                offset = Some(offset.map_or(update.update_id + 1, |current: i64| {
                    current.max(update.update_id + 1)
                }));

                let correlation_id = format!("update-{}", update.update_id);
                debug!(
                    event_name = "ingress.telegram.update_received",
                    correlation_id = %correlation_id,
                    "received telegram update"
                );

                let (previous, done) = lanes.enqueue(update.chat_id());
                let dispatcher = Arc::clone(&self.dispatcher);
                in_flight.spawn(async move {
                    if let Some(previous) = previous {
                        // Closes once the earlier task ends, panics included.
                        let _ = previous.await;
                    }
                    let context = EventContext { correlation_id };
                    if let Err(error) = dispatcher.dispatch(&update, &context).await {
                        warn!(
                            correlation_id = %context.correlation_id,
                            error = %error,
                            "update dispatch failed; continuing polling loop"
                        );
                    }
                    drop(done);
                });
            }
        }

        drain(&mut in_flight).await;
        Ok(())
    }
}

/// Tail of each chat's dispatch chain. A task waits for the completion
/// signal of the task queued before it in the same chat.
#[derive(Default)]
struct ChatLanes {
    tails: HashMap<i64, oneshot::Receiver<()>>,
}

impl ChatLanes {
    /// Returns the signal to wait on and the sender to drop once done.
    fn enqueue(&mut self, chat_id: Option<i64>) -> (Option<oneshot::Receiver<()>>, oneshot::Sender<()>) {
        let (done, tail) = oneshot::channel();
        let previous = match chat_id {
            Some(chat_id) => self.tails.insert(chat_id, tail),
            None => None,
        };
        (previous, done)
    }

    /// Forgets chats whose last queued task has finished.
    fn prune(&mut self) {
        self.tails.retain(|_, tail| matches!(tail.try_recv(), Err(oneshot::error::TryRecvError::Empty)));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tails.len()
    }
}

async fn drain(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.join_next().await {
        if let Err(error) = joined {
            warn!(error = %error, "update task aborted");
        }
    }
}
