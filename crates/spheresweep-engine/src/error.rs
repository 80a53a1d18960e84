//! Engine error types

use spheresweep_cloud::{CloudError, OperationError, OperationId};
use thiserror::Error;

/// Terminal failure of an operation poll
#[derive(Error, Debug)]
pub enum PollError {
    /// The status request itself failed. Not retried by the poller.
    #[error("operation {operation_id}: status request failed: {source}")]
    Transport {
        operation_id: OperationId,
        #[source]
        source: CloudError,
    },

    #[error("operation {operation_id} failed with {error}")]
    Operation {
        operation_id: OperationId,
        error: OperationError,
    },

    #[error("operation {operation_id}: polling limit exceeded after {polls} polls")]
    LimitExceeded {
        operation_id: OperationId,
        polls: u32,
    },
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("failed to list communities: {0}")]
    Discovery(#[source] CloudError),

    #[error("delete request failed: {0}")]
    Request(#[from] CloudError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

pub type Result<T> = std::result::Result<T, SweepError>;
