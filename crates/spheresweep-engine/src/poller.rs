//! Operation status polling
//!
//! Delete calls return as soon as the request is accepted. The poller follows
//! the resulting operation until it is done, fails, exhausts its poll budget,
//! or the sweep is cancelled.

use crate::error::PollError;
use crate::settings::PollConfig;
use spheresweep_cloud::{DatasphereApi, OperationId};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Final state of a polled operation as seen by the caller
#[derive(Debug)]
pub enum PollOutcome {
    /// Done without error, carrying the operation response
    Completed(serde_json::Value),

    Failed(PollError),

    /// Cancelled before a result was delivered. Neither success nor failure.
    Abandoned,
}

impl PollOutcome {
    /// Fold the two delivery channels of [`OperationPoller::poll`] into one outcome
    ///
    /// Two closed channels mean the poll was abandoned.
    pub async fn from_channels(
        mut response_rx: oneshot::Receiver<serde_json::Value>,
        mut error_rx: oneshot::Receiver<PollError>,
    ) -> Self {
        tokio::select! {
            Ok(response) = &mut response_rx => PollOutcome::Completed(response),
            Ok(error) = &mut error_rx => PollOutcome::Failed(error),
            else => PollOutcome::Abandoned,
        }
    }
}

/// Polls the operation service for a single operation at a time
pub struct OperationPoller<A: ?Sized> {
    api: Arc<A>,
    config: PollConfig,
    cancel: CancellationToken,
}

impl<A: ?Sized> Clone for OperationPoller<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            config: self.config.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<A: DatasphereApi + ?Sized + 'static> OperationPoller<A> {
    pub fn new(api: Arc<A>, config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            api,
            config,
            cancel,
        }
    }

    /// Start polling `operation_id` in the background
    ///
    /// Exactly one of the returned receivers gets a value, unless the
    /// cancellation token fires first; then both are closed empty.
    pub fn poll(
        &self,
        operation_id: OperationId,
    ) -> (
        oneshot::Receiver<serde_json::Value>,
        oneshot::Receiver<PollError>,
    ) {
        let (response_tx, response_rx) = oneshot::channel();
        let (error_tx, error_rx) = oneshot::channel();

        let api = Arc::clone(&self.api);
        let config = self.config.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!("Stopped polling operation {}: cancelled", operation_id);
                }
                result = poll_until_terminal(api.as_ref(), &operation_id, &config) => {
                    match result {
                        Ok(response) => {
                            let _ = response_tx.send(response);
                        }
                        Err(e) => {
                            let _ = error_tx.send(e);
                        }
                    }
                }
            }
        });

        (response_rx, error_rx)
    }

    /// Poll `operation_id` and wait for its outcome
    pub async fn wait(&self, operation_id: OperationId) -> PollOutcome {
        let (response_rx, error_rx) = self.poll(operation_id);
        PollOutcome::from_channels(response_rx, error_rx).await
    }
}

async fn poll_until_terminal<A: DatasphereApi + ?Sized>(
    api: &A,
    operation_id: &OperationId,
    config: &PollConfig,
) -> Result<serde_json::Value, PollError> {
    let max_polls = config.max_polls.max(1);

    sleep(config.initial_delay).await;

    for poll in 1..=max_polls {
        let status = api
            .get_operation(operation_id)
            .await
            .map_err(|source| PollError::Transport {
                operation_id: operation_id.clone(),
                source,
            })?;

        if status.done {
            return match status.error {
                Some(error) => Err(PollError::Operation {
                    operation_id: operation_id.clone(),
                    error,
                }),
                None => Ok(status.response.unwrap_or(serde_json::Value::Null)),
            };
        }

        tracing::debug!(
            "Operation {} still running (poll {}/{})",
            operation_id,
            poll,
            max_polls
        );

        if poll < max_polls {
            sleep(config.interval).await;
        }
    }

    Err(PollError::LimitExceeded {
        operation_id: operation_id.clone(),
        polls: max_polls,
    })
}
