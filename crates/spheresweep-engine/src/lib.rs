//! spheresweep deletion engine
//!
//! Concurrent pipeline that deletes Datasphere projects, then the communities
//! that own them, once every project of a community is gone.
//!
//! - [`retry::Retrier`]: bounded retry with a fixed delay
//! - [`debounce::Debouncer`]: paces invocations without dropping any
//! - [`poller::OperationPoller`]: follows asynchronous operations to completion
//! - [`logbook::Logbook`]: per-community child counters
//! - [`sweeper::Sweeper`]: the orchestrator tying them together

pub mod countdown;
pub mod debounce;
pub mod error;
pub mod logbook;
pub mod poller;
pub mod report;
pub mod retry;
pub mod settings;
pub mod sweeper;

// Re-exports
pub use countdown::Countdown;
pub use debounce::{Debouncer, schedule_slot};
pub use error::{PollError, Result, SweepError};
pub use logbook::{ChildOutcome, CommunityOutcome, Logbook, LogbookEntry, Resolution, Settlement};
pub use poller::{OperationPoller, PollOutcome};
pub use report::{CommunityReport, SweepReport};
pub use retry::Retrier;
pub use settings::{PollConfig, RetryConfig, StageSettings, SweepSettings};
pub use sweeper::{DiscoveredCommunity, ProjectListing, ResourceKind, Sweeper};
