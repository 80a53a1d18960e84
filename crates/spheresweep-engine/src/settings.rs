//! Timing and limit settings for the deletion stages

use std::time::Duration;

/// Fixed-delay retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one. Values below 1 act as 1.
    pub max_attempts: u32,

    /// Delay between two attempts
    pub delay: Duration,
}

impl RetryConfig {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

/// Operation polling configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first status request
    pub initial_delay: Duration,

    /// Wait between two status requests
    pub interval: Duration,

    /// Number of status requests before giving up
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            interval: Duration::from_secs(1),
            max_polls: 15,
        }
    }
}

/// Settings of one deletion stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSettings {
    /// Minimum spacing between two delete invocations of the stage
    pub pacing: Duration,
    pub retry: RetryConfig,
    pub poll: PollConfig,
}

/// Settings of a whole sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSettings {
    pub projects: StageSettings,
    pub communities: StageSettings,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            projects: StageSettings {
                pacing: Duration::from_millis(1500),
                retry: RetryConfig::fixed(5, Duration::from_secs(1)),
                poll: PollConfig::default(),
            },
            communities: StageSettings {
                pacing: Duration::from_secs(1),
                retry: RetryConfig::fixed(3, Duration::from_secs(1)),
                poll: PollConfig::default(),
            },
        }
    }
}
