//! Sweep summary

use crate::logbook::CommunityOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use spheresweep_cloud::Community;

/// Final counters of one community
#[derive(Debug, Clone, Serialize)]
pub struct CommunityReport {
    pub community: Community,

    /// Projects discovered in the community
    pub total: i32,

    /// Projects deleted
    pub succeeded: i32,

    /// Projects that could not be deleted
    pub failed: i32,

    /// Projects whose deletion was cancelled
    pub abandoned: i32,

    /// Projects never resolved. Zero after a completed sweep.
    pub pending: i32,

    pub outcome: Option<CommunityOutcome>,
}

impl CommunityReport {
    /// Every project is known and was deleted
    ///
    /// A community whose projects could not be listed never counts as cleaned.
    pub fn children_cleaned(&self) -> bool {
        self.pending == 0
            && self.failed == 0
            && self.abandoned == 0
            && !matches!(self.outcome, Some(CommunityOutcome::ListingFailed(_)))
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.outcome, Some(CommunityOutcome::Deleted))
    }

    /// Projects actually resolved (deleted or failed)
    pub fn resolved(&self) -> i32 {
        self.succeeded + self.failed
    }
}

/// Result of a whole sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Per-community counters, ordered by community id
    pub communities: Vec<CommunityReport>,

    pub finished_at: DateTime<Utc>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl SweepReport {
    pub fn new(communities: Vec<CommunityReport>) -> Self {
        Self {
            communities,
            finished_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.communities.len()
    }

    /// Communities whose projects were all deleted
    pub fn children_cleaned(&self) -> usize {
        self.communities
            .iter()
            .filter(|c| c.children_cleaned())
            .count()
    }

    /// Communities that were deleted themselves
    pub fn deleted(&self) -> usize {
        self.communities.iter().filter(|c| c.is_deleted()).count()
    }

    /// True when every community was deleted
    pub fn is_success(&self) -> bool {
        self.deleted() == self.total()
    }

    pub fn community(&self, community_id: &str) -> Option<&CommunityReport> {
        self.communities
            .iter()
            .find(|c| c.community.id == community_id)
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Statistic - (total|deleted|failed) Projects")?;
        for c in &self.communities {
            let outcome = c
                .outcome
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unresolved".to_string());
            writeln!(
                f,
                "\tCommunity {} ({}|{}|{}) {}",
                c.community.id, c.total, c.succeeded, c.failed, outcome
            )?;
        }
        write!(
            f,
            "Communities deleted {}/{}",
            self.deleted(),
            self.total()
        )
    }
}
