//! spheresweep cloud abstraction
//!
//! Resource model and API boundary shared by the deletion engine and the
//! Datasphere REST client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 spheresweep CLI                  │
//! │                 (sweep run/list)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               spheresweep-engine                 │
//! │   Debouncer → Retrier → delete → Poller          │
//! │   Completion Logbook / Countdown                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │  trait DatasphereApi
//! ┌─────────────────▼───────────────────────────────┐
//! │             spheresweep-datasphere               │
//! │   IAM token / communities / projects / ops       │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod operation;
pub mod provider;
pub mod resource;

// Re-exports
pub use error::{CloudError, Result};
pub use operation::{OperationError, OperationId, OperationStatus};
pub use provider::DatasphereApi;
pub use resource::{Community, Project};
