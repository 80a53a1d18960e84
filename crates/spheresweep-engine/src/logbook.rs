//! Completion logbook
//!
//! Single source of truth for "have all children of this community been
//! resolved". Every counter update and the zero check run under one write
//! lock, so exactly one child resolution observes the zero transition.

use crate::report::{CommunityReport, SweepReport};
use serde::Serialize;
use spheresweep_cloud::Community;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// How a single project deletion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    Deleted,
    Failed,
    /// Cancelled while polling
    Abandoned,
}

/// Terminal state of a community itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CommunityOutcome {
    Deleted,
    DeletionFailed(String),
    /// Kept because at least one project could not be deleted
    Retained,
    /// Kept because its projects could not be listed
    ListingFailed(String),
    Abandoned,
}

impl std::fmt::Display for CommunityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommunityOutcome::Deleted => write!(f, "deleted"),
            CommunityOutcome::DeletionFailed(reason) => write!(f, "deletion failed: {}", reason),
            CommunityOutcome::Retained => write!(f, "retained (project failures)"),
            CommunityOutcome::ListingFailed(reason) => {
                write!(f, "retained (project listing failed: {})", reason)
            }
            CommunityOutcome::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Per-community child counters
#[derive(Debug, Clone)]
pub struct LogbookEntry {
    community: Community,
    total_children: i32,
    pending_children: i32,
    succeeded: i32,
    failed: i32,
    abandoned: i32,
    outcome: Option<CommunityOutcome>,
}

impl LogbookEntry {
    fn new(community: Community, child_count: i32) -> Self {
        Self {
            community,
            total_children: child_count,
            pending_children: child_count,
            succeeded: 0,
            failed: 0,
            abandoned: 0,
            outcome: None,
        }
    }

    pub fn pending_children(&self) -> i32 {
        self.pending_children
    }

    pub fn succeeded(&self) -> i32 {
        self.succeeded
    }

    pub fn failed(&self) -> i32 {
        self.failed
    }

    pub fn abandoned(&self) -> i32 {
        self.abandoned
    }

    pub fn outcome(&self) -> Option<&CommunityOutcome> {
        self.outcome.as_ref()
    }

    fn to_report(&self) -> CommunityReport {
        CommunityReport {
            community: self.community.clone(),
            total: self.total_children,
            succeeded: self.succeeded,
            failed: self.failed,
            abandoned: self.abandoned,
            pending: self.pending_children,
            outcome: self.outcome.clone(),
        }
    }
}

/// Counters captured at the zero transition of a community
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub community: Community,
    pub succeeded: i32,
    pub failed: i32,
    pub abandoned: i32,
}

impl Settlement {
    /// True when every child was deleted
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.abandoned == 0
    }
}

/// Result of [`Logbook::resolve_child`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Other children are still in flight
    Pending { remaining: i32 },

    /// This call resolved the last child. Returned once per community.
    Settled(Settlement),

    /// Every child was already resolved; nothing changed
    Exhausted,

    /// The community was never seeded
    Unknown,
}

#[derive(Debug, Default)]
pub struct Logbook {
    entries: RwLock<HashMap<String, LogbookEntry>>,
}

impl Logbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry of `community` with `child_count` pending children
    ///
    /// Must happen before any child of the community is resolved.
    pub async fn seed(&self, community: Community, child_count: usize) {
        let child_count = i32::try_from(child_count).unwrap_or(i32::MAX);
        let mut entries = self.entries.write().await;
        if entries.contains_key(&community.id) {
            tracing::warn!("Community {} seeded twice, resetting its counters", community.id);
        }
        entries.insert(
            community.id.clone(),
            LogbookEntry::new(community, child_count),
        );
    }

    /// Record the outcome of one child of `community_id`
    pub async fn resolve_child(&self, community_id: &str, outcome: ChildOutcome) -> Resolution {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(community_id) else {
            return Resolution::Unknown;
        };

        if entry.pending_children == 0 {
            return Resolution::Exhausted;
        }

        entry.pending_children -= 1;
        match outcome {
            ChildOutcome::Deleted => entry.succeeded += 1,
            ChildOutcome::Failed => entry.failed += 1,
            ChildOutcome::Abandoned => entry.abandoned += 1,
        }

        if entry.pending_children > 0 {
            return Resolution::Pending {
                remaining: entry.pending_children,
            };
        }

        Resolution::Settled(Settlement {
            community: entry.community.clone(),
            succeeded: entry.succeeded,
            failed: entry.failed,
            abandoned: entry.abandoned,
        })
    }

    /// Store the terminal outcome of the community itself
    ///
    /// Returns false when the community was never seeded.
    pub async fn record_outcome(&self, community_id: &str, outcome: CommunityOutcome) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(community_id) {
            Some(entry) => {
                if let Some(previous) = &entry.outcome {
                    tracing::warn!(
                        "Community {} already recorded as {}, keeping it",
                        community_id,
                        previous
                    );
                } else {
                    entry.outcome = Some(outcome);
                }
                true
            }
            None => false,
        }
    }

    pub async fn entry(&self, community_id: &str) -> Option<LogbookEntry> {
        self.entries.read().await.get(community_id).cloned()
    }

    /// Build the final report
    ///
    /// Only meaningful once every community has been counted down.
    pub async fn summarize(&self) -> SweepReport {
        let entries = self.entries.read().await;
        let mut communities: Vec<CommunityReport> =
            entries.values().map(LogbookEntry::to_report).collect();
        communities.sort_by(|a, b| a.community.id.cmp(&b.community.id));

        SweepReport::new(communities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn community(id: &str) -> Community {
        Community::new(id, format!("{id}-name"))
    }

    #[tokio::test]
    async fn test_zero_transition_fires_once() {
        let logbook = Logbook::new();
        logbook.seed(community("c-1"), 2).await;

        assert_eq!(
            logbook.resolve_child("c-1", ChildOutcome::Deleted).await,
            Resolution::Pending { remaining: 1 }
        );

        match logbook.resolve_child("c-1", ChildOutcome::Deleted).await {
            Resolution::Settled(settlement) => {
                assert!(settlement.is_clean());
                assert_eq!(settlement.succeeded, 2);
                assert_eq!(settlement.community.id, "c-1");
            }
            other => panic!("expected settlement, got {other:?}"),
        }

        assert_eq!(
            logbook.resolve_child("c-1", ChildOutcome::Deleted).await,
            Resolution::Exhausted
        );
        let entry = logbook.entry("c-1").await.unwrap();
        assert_eq!(entry.pending_children(), 0);
        assert_eq!(entry.succeeded(), 2);
    }

    #[tokio::test]
    async fn test_failed_child_makes_settlement_dirty() {
        let logbook = Logbook::new();
        logbook.seed(community("c-1"), 2).await;

        logbook.resolve_child("c-1", ChildOutcome::Failed).await;
        let Resolution::Settled(settlement) =
            logbook.resolve_child("c-1", ChildOutcome::Deleted).await
        else {
            panic!("expected settlement");
        };

        assert!(!settlement.is_clean());
        assert_eq!(settlement.failed, 1);
        assert_eq!(settlement.succeeded, 1);
    }

    #[tokio::test]
    async fn test_unknown_community() {
        let logbook = Logbook::new();

        assert_eq!(
            logbook.resolve_child("missing", ChildOutcome::Deleted).await,
            Resolution::Unknown
        );
        assert!(
            !logbook
                .record_outcome("missing", CommunityOutcome::Deleted)
                .await
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolutions_settle_exactly_once() {
        let logbook = Arc::new(Logbook::new());
        logbook.seed(community("c-1"), 64).await;

        let mut handles = Vec::new();
        for i in 0..64 {
            let logbook = Arc::clone(&logbook);
            handles.push(tokio::spawn(async move {
                let outcome = if i % 2 == 0 {
                    ChildOutcome::Deleted
                } else {
                    ChildOutcome::Failed
                };
                logbook.resolve_child("c-1", outcome).await
            }));
        }

        let mut settled = 0;
        for handle in handles {
            if let Resolution::Settled(_) = handle.await.unwrap() {
                settled += 1;
            }
        }

        assert_eq!(settled, 1);
        let entry = logbook.entry("c-1").await.unwrap();
        assert_eq!(entry.succeeded(), 32);
        assert_eq!(entry.failed(), 32);
    }

    #[tokio::test]
    async fn test_first_outcome_wins() {
        let logbook = Logbook::new();
        logbook.seed(community("c-1"), 0).await;

        assert!(logbook.record_outcome("c-1", CommunityOutcome::Deleted).await);
        assert!(
            logbook
                .record_outcome("c-1", CommunityOutcome::DeletionFailed("late".into()))
                .await
        );

        let entry = logbook.entry("c-1").await.unwrap();
        assert_eq!(entry.outcome(), Some(&CommunityOutcome::Deleted));
    }

    #[tokio::test]
    async fn test_summarize() {
        let logbook = Logbook::new();
        logbook.seed(community("c-b"), 1).await;
        logbook.seed(community("c-a"), 2).await;

        logbook.resolve_child("c-a", ChildOutcome::Deleted).await;
        logbook.resolve_child("c-a", ChildOutcome::Deleted).await;
        logbook.record_outcome("c-a", CommunityOutcome::Deleted).await;
        logbook.resolve_child("c-b", ChildOutcome::Failed).await;
        logbook.record_outcome("c-b", CommunityOutcome::Retained).await;

        let report = logbook.summarize().await;

        assert_eq!(report.total(), 2);
        assert_eq!(report.children_cleaned(), 1);
        assert_eq!(report.deleted(), 1);
        assert_eq!(report.communities[0].community.id, "c-a");
        assert_eq!(report.communities[1].failed, 1);
    }
}
