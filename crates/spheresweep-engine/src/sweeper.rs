//! Deletion orchestrator
//!
//! ```text
//!  discover ──► seed logbook ──► project channel ──► Debouncer ─► Retrier ─► delete ─► Poller
//!     │                                                                                │
//!     │ (no projects)                                                   resolve_child  │
//!     ▼                                                                                ▼
//!  community channel ◄──────────────── clean settlement ◄──────────────────────── Logbook
//!     │
//!     └──► Debouncer ─► Retrier ─► delete ─► Poller ─► record outcome ─► Countdown
//! ```
//!
//! Every community is counted down exactly once, whether it was deleted, its
//! deletion failed, or it was kept because a project could not be removed.

use crate::countdown::Countdown;
use crate::debounce::Debouncer;
use crate::error::{Result, SweepError};
use crate::logbook::{ChildOutcome, CommunityOutcome, Logbook, Resolution, Settlement};
use crate::poller::{OperationPoller, PollOutcome};
use crate::report::SweepReport;
use crate::retry::Retrier;
use crate::settings::{StageSettings, SweepSettings};
use spheresweep_cloud::{CloudError, Community, DatasphereApi, Project};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Kind of resource a delete call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Community,
    Project,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Community => write!(f, "Community"),
            ResourceKind::Project => write!(f, "Project"),
        }
    }
}

/// Result of listing the projects of a community
#[derive(Debug, Clone)]
pub enum ProjectListing {
    Listed(Vec<Project>),
    Failed(String),
}

/// A community together with its projects, as found during discovery
#[derive(Debug, Clone)]
pub struct DiscoveredCommunity {
    pub community: Community,
    pub projects: ProjectListing,
}

impl DiscoveredCommunity {
    pub fn project_count(&self) -> usize {
        match &self.projects {
            ProjectListing::Listed(projects) => projects.len(),
            ProjectListing::Failed(_) => 0,
        }
    }
}

/// A project on its way to the project stage
///
/// Carries the id of the community the project was discovered under, which is
/// the logbook key its resolution is counted against.
#[derive(Debug, Clone)]
struct QueuedProject {
    community_id: String,
    project: Project,
}

/// How a delete attempt ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Deleted,
    Abandoned,
}

/// Delete call followed by polling, wrapped in a retrier
struct Deleter<A: ?Sized> {
    api: Arc<A>,
    poller: OperationPoller<A>,
    retrier: Retrier,
    cancel: CancellationToken,
}

impl<A: DatasphereApi + ?Sized + 'static> Deleter<A> {
    fn new(api: Arc<A>, settings: &StageSettings, cancel: CancellationToken) -> Self {
        Self {
            poller: OperationPoller::new(Arc::clone(&api), settings.poll.clone(), cancel.clone()),
            retrier: Retrier::new(settings.retry.clone()),
            api,
            cancel,
        }
    }

    async fn attempt(&self, kind: ResourceKind, id: &str) -> Result<Completion> {
        // Queued work still reaches its slot after cancellation; it must not
        // start a new deletion.
        if self.cancel.is_cancelled() {
            tracing::debug!("{} {} skipped, sweep was cancelled", kind, id);
            return Ok(Completion::Abandoned);
        }

        let operation_id = match kind {
            ResourceKind::Community => self.api.delete_community(id).await?,
            ResourceKind::Project => self.api.delete_project(id).await?,
        };
        tracing::debug!("{} {} delete accepted as operation {}", kind, id, operation_id);

        match self.poller.wait(operation_id).await {
            PollOutcome::Completed(_) => Ok(Completion::Deleted),
            PollOutcome::Failed(e) => Err(SweepError::Poll(e)),
            PollOutcome::Abandoned => Ok(Completion::Abandoned),
        }
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<Completion> {
        self.retrier.call(|| self.attempt(kind, id)).await
    }
}

/// State shared by the tasks of both stages
struct Shared {
    logbook: Arc<Logbook>,
    countdown: Countdown,
}

impl Shared {
    async fn finish_community(&self, community_id: &str, outcome: CommunityOutcome) {
        if !self.logbook.record_outcome(community_id, outcome).await {
            tracing::warn!("Community {} is not in the logbook", community_id);
        }
        self.countdown.count_down();
    }
}

struct ProjectStage<A: ?Sized> {
    deleter: Deleter<A>,
    shared: Arc<Shared>,
    community_tx: mpsc::UnboundedSender<Community>,
}

impl<A: DatasphereApi + ?Sized + 'static> ProjectStage<A> {
    async fn run(&self, queued: QueuedProject) {
        let QueuedProject {
            community_id,
            project,
        } = queued;
        tracing::info!(
            "\tDeleting Project {} from Community {}",
            project.id,
            community_id
        );

        let outcome = match self.deleter.delete(ResourceKind::Project, &project.id).await {
            Ok(Completion::Deleted) => {
                tracing::info!("\tProject {} was deleted", project.id);
                ChildOutcome::Deleted
            }
            Ok(Completion::Abandoned) => {
                tracing::warn!("\tProject {} deletion was abandoned", project.id);
                ChildOutcome::Abandoned
            }
            Err(e) => {
                tracing::warn!("\tProject {} was not deleted cause {}", project.id, e);
                ChildOutcome::Failed
            }
        };

        self.resolve(&community_id, &project, outcome).await;
    }

    async fn resolve(&self, community_id: &str, project: &Project, outcome: ChildOutcome) {
        match self
            .shared
            .logbook
            .resolve_child(community_id, outcome)
            .await
        {
            Resolution::Pending { remaining } => {
                tracing::debug!(
                    "Community {} waits for {} more projects",
                    community_id,
                    remaining
                );
            }
            Resolution::Settled(settlement) if settlement.is_clean() => {
                self.dispatch_community(settlement.community).await;
            }
            Resolution::Settled(settlement) => self.retain(settlement).await,
            Resolution::Exhausted => {
                tracing::warn!(
                    "Project {} resolved after Community {} was settled",
                    project.id,
                    community_id
                );
            }
            Resolution::Unknown => {
                tracing::warn!(
                    "Project {} belongs to unknown Community {}",
                    project.id,
                    community_id
                );
            }
        }
    }

    async fn dispatch_community(&self, community: Community) {
        if let Err(mpsc::error::SendError(community)) = self.community_tx.send(community) {
            tracing::error!("Community stage stopped before {} was queued", community.id);
            self.shared
                .finish_community(
                    &community.id,
                    CommunityOutcome::DeletionFailed("community stage stopped".to_string()),
                )
                .await;
        }
    }

    async fn retain(&self, settlement: Settlement) {
        let outcome = if settlement.failed > 0 {
            tracing::warn!(
                "\tCommunity {} is kept: {} of its projects were not deleted",
                settlement.community.id,
                settlement.failed
            );
            CommunityOutcome::Retained
        } else {
            tracing::warn!(
                "\tCommunity {} is kept: {} project deletions were abandoned",
                settlement.community.id,
                settlement.abandoned
            );
            CommunityOutcome::Abandoned
        };

        self.shared
            .finish_community(&settlement.community.id, outcome)
            .await;
    }
}

struct CommunityStage<A: ?Sized> {
    deleter: Deleter<A>,
    shared: Arc<Shared>,
}

impl<A: DatasphereApi + ?Sized + 'static> CommunityStage<A> {
    async fn run(&self, community: Community) {
        tracing::info!("\tDeleting Community {}", community.id);

        let outcome = match self
            .deleter
            .delete(ResourceKind::Community, &community.id)
            .await
        {
            Ok(Completion::Deleted) => {
                tracing::info!("\tCommunity {} was deleted", community.id);
                CommunityOutcome::Deleted
            }
            Ok(Completion::Abandoned) => {
                tracing::warn!("\tCommunity {} deletion was abandoned", community.id);
                CommunityOutcome::Abandoned
            }
            Err(e) => {
                tracing::warn!("\tCommunity {} was not deleted cause {}", community.id, e);
                CommunityOutcome::DeletionFailed(e.to_string())
            }
        };

        self.shared.finish_community(&community.id, outcome).await;
    }
}

/// Top-level deletion pipeline
pub struct Sweeper<A: ?Sized> {
    api: Arc<A>,
    logbook: Arc<Logbook>,
    settings: SweepSettings,
    cancel: CancellationToken,
}

impl<A: DatasphereApi + ?Sized + 'static> Sweeper<A> {
    pub fn new(api: Arc<A>, settings: SweepSettings) -> Self {
        Self {
            api,
            logbook: Arc::new(Logbook::new()),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn logbook(&self) -> &Arc<Logbook> {
        &self.logbook
    }

    /// Token that abandons every in-flight poll when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// List the matching communities and the projects of each
    ///
    /// Failing to list communities aborts; failing to list the projects of
    /// one community is recorded on that community only.
    pub async fn discover(
        &self,
        organization_id: &str,
        name_filter: &str,
    ) -> Result<Vec<DiscoveredCommunity>> {
        let communities = self
            .api
            .list_communities(organization_id, name_filter)
            .await
            .map_err(SweepError::Discovery)?;

        let mut discovered = Vec::with_capacity(communities.len());
        for community in communities {
            let projects = match self.api.list_projects(&community.id).await {
                Ok(projects) => ProjectListing::Listed(projects),
                Err(e) => {
                    tracing::warn!("Could not list projects of Community {}: {}", community.id, e);
                    ProjectListing::Failed(describe(&e))
                }
            };
            discovered.push(DiscoveredCommunity {
                community,
                projects,
            });
        }

        Ok(discovered)
    }

    /// Discover and delete everything matching `name_filter`
    pub async fn run(&self, organization_id: &str, name_filter: &str) -> Result<SweepReport> {
        tracing::info!("Cleaning started");

        let discovered = self.discover(organization_id, name_filter).await?;
        let report = self.sweep(discovered).await;

        tracing::info!("Cleaning finished");
        Ok(report)
    }

    /// Delete already discovered communities and their projects
    pub async fn sweep(&self, discovered: Vec<DiscoveredCommunity>) -> SweepReport {
        tracing::info!("Communities number is {}", discovered.len());
        let started = Instant::now();

        // Every entry exists before the first project can resolve.
        for item in &discovered {
            self.logbook
                .seed(item.community.clone(), item.project_count())
                .await;
        }

        let shared = Arc::new(Shared {
            logbook: Arc::clone(&self.logbook),
            countdown: Countdown::new(discovered.len()),
        });

        let (community_tx, community_rx) = mpsc::unbounded_channel::<Community>();
        let (project_tx, project_rx) = mpsc::unbounded_channel::<QueuedProject>();

        let community_stage = Arc::new(CommunityStage {
            deleter: Deleter::new(
                Arc::clone(&self.api),
                &self.settings.communities,
                self.cancel.clone(),
            ),
            shared: Arc::clone(&shared),
        });
        let project_stage = Arc::new(ProjectStage {
            deleter: Deleter::new(
                Arc::clone(&self.api),
                &self.settings.projects,
                self.cancel.clone(),
            ),
            shared: Arc::clone(&shared),
            community_tx: community_tx.clone(),
        });

        let community_loop = spawn_stage(
            community_rx,
            self.settings.communities.pacing,
            move |community: Community| {
                let stage = Arc::clone(&community_stage);
                async move { stage.run(community).await }
            },
        );
        let project_loop = spawn_stage(
            project_rx,
            self.settings.projects.pacing,
            move |queued: QueuedProject| {
                let stage = Arc::clone(&project_stage);
                async move { stage.run(queued).await }
            },
        );

        for item in discovered {
            match item.projects {
                ProjectListing::Failed(reason) => {
                    tracing::warn!(
                        "\tCommunity {} is kept: its projects could not be listed",
                        item.community.id
                    );
                    shared
                        .finish_community(&item.community.id, CommunityOutcome::ListingFailed(reason))
                        .await;
                }
                ProjectListing::Listed(projects) if projects.is_empty() => {
                    if let Err(mpsc::error::SendError(community)) = community_tx.send(item.community)
                    {
                        shared
                            .finish_community(
                                &community.id,
                                CommunityOutcome::DeletionFailed(
                                    "community stage stopped".to_string(),
                                ),
                            )
                            .await;
                    }
                }
                ProjectListing::Listed(projects) => {
                    for project in projects {
                        if project.community_id != item.community.id {
                            tracing::warn!(
                                "Project {} listed under Community {} reports Community {}",
                                project.id,
                                item.community.id,
                                project.community_id
                            );
                        }
                        let queued = QueuedProject {
                            community_id: item.community.id.clone(),
                            project,
                        };
                        if let Err(mpsc::error::SendError(queued)) = project_tx.send(queued) {
                            tracing::error!(
                                "Project stage stopped before {} was queued",
                                queued.project.id
                            );
                            if let Resolution::Settled(settlement) = self
                                .logbook
                                .resolve_child(&queued.community_id, ChildOutcome::Failed)
                                .await
                            {
                                shared
                                    .finish_community(
                                        &settlement.community.id,
                                        CommunityOutcome::Retained,
                                    )
                                    .await;
                            }
                        }
                    }
                }
            }
        }

        shared.countdown.wait().await;

        drop(project_tx);
        drop(community_tx);
        if let Err(e) = project_loop.await {
            tracing::error!("Project stage ended abnormally: {}", e);
        }
        if let Err(e) = community_loop.await {
            tracing::error!("Community stage ended abnormally: {}", e);
        }

        let mut report = self.logbook.summarize().await;
        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            "Communities deleted {}/{}",
            report.deleted(),
            report.total()
        );
        report
    }
}

/// Drain `rx`, spawning one paced task per item
fn spawn_stage<T, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<T>,
    pacing: std::time::Duration,
    f: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let debouncer = Debouncer::new(pacing, f);
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            debouncer.submit(item);
        }
    })
}

fn describe(error: &CloudError) -> String {
    match error {
        CloudError::Api { status, .. } => format!("HTTP {}", status),
        other => other.to_string(),
    }
}
