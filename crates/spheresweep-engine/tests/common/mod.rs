use async_trait::async_trait;
use spheresweep_cloud::{
    CloudError, Community, DatasphereApi, OperationId, OperationStatus, Project, Result,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;

/// Scripted behaviour of one resource's delete call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Behavior {
    /// Request accepted, operation completes successfully
    Delete,
    /// Request rejected with HTTP 500
    RejectRequest,
    /// Request accepted, operation completes with an error payload
    FailOperation,
    /// Request accepted, operation never completes
    NeverFinish,
    /// The first `n` operations fail, the next one succeeds
    FlakyThenDelete(u32),
}

#[derive(Debug, Clone, Copy)]
enum Plan {
    Succeed,
    Fail,
    Pending,
}

/// Recorded delete call
#[derive(Debug, Clone)]
pub struct DeleteCall {
    pub kind: &'static str,
    pub id: String,
    pub at: Instant,
}

/// In-memory Datasphere organization
#[derive(Default)]
pub struct FakeDatasphere {
    communities: Vec<Community>,
    projects: HashMap<String, Option<Vec<Project>>>,
    behaviors: HashMap<String, Behavior>,
    fail_community_listing: bool,
    attempts: Mutex<HashMap<String, u32>>,
    operations: Mutex<HashMap<String, Plan>>,
    calls: Mutex<Vec<DeleteCall>>,
}

#[allow(dead_code)]
impl FakeDatasphere {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn community(mut self, id: &str, project_ids: &[&str]) -> Self {
        self.communities.push(Community::new(id, format!("{id}-name")));
        let projects = project_ids
            .iter()
            .map(|p| Project::new(*p, id, format!("{p}-name")))
            .collect();
        self.projects.insert(id.to_string(), Some(projects));
        self
    }

    /// Project listed under `community_id` whose own record names another community
    pub fn misfiled_project(mut self, community_id: &str, project_id: &str, reported: &str) -> Self {
        if !self.communities.iter().any(|c| c.id == community_id) {
            self.communities
                .push(Community::new(community_id, format!("{community_id}-name")));
        }
        let project = Project::new(project_id, reported, format!("{project_id}-name"));
        self.projects
            .entry(community_id.to_string())
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(project);
        self
    }

    /// Community whose project listing fails
    pub fn unlistable_community(mut self, id: &str) -> Self {
        self.communities.push(Community::new(id, format!("{id}-name")));
        self.projects.insert(id.to_string(), None);
        self
    }

    pub fn behavior(mut self, id: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(id.to_string(), behavior);
        self
    }

    pub fn failing_community_listing(mut self) -> Self {
        self.fail_community_listing = true;
        self
    }

    pub fn calls(&self) -> Vec<DeleteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: &str) -> Vec<DeleteCall> {
        self.calls().into_iter().filter(|c| c.id == id).collect()
    }

    pub fn community_deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == "community")
            .map(|c| c.id)
            .collect()
    }

    fn accept(&self, kind: &'static str, id: &str) -> Result<OperationId> {
        self.calls.lock().unwrap().push(DeleteCall {
            kind,
            id: id.to_string(),
            at: Instant::now(),
        });

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(id.to_string()).or_insert(0);
            *n += 1;
            *n
        };

        let plan = match self.behaviors.get(id).copied().unwrap_or(Behavior::Delete) {
            Behavior::Delete => Plan::Succeed,
            Behavior::RejectRequest => {
                return Err(CloudError::api(500, format!("cannot delete {id}")));
            }
            Behavior::FailOperation => Plan::Fail,
            Behavior::NeverFinish => Plan::Pending,
            Behavior::FlakyThenDelete(n) if attempt <= n => Plan::Fail,
            Behavior::FlakyThenDelete(_) => Plan::Succeed,
        };

        let operation_id = format!("op-{id}-{attempt}");
        self.operations
            .lock()
            .unwrap()
            .insert(operation_id.clone(), plan);
        Ok(OperationId::new(operation_id))
    }
}

#[async_trait]
impl DatasphereApi for FakeDatasphere {
    async fn list_communities(&self, _organization_id: &str, name_filter: &str) -> Result<Vec<Community>> {
        if self.fail_community_listing {
            return Err(CloudError::api(403, "permission denied"));
        }
        Ok(self
            .communities
            .iter()
            .filter(|c| c.name.contains(name_filter))
            .cloned()
            .collect())
    }

    async fn list_projects(&self, community_id: &str) -> Result<Vec<Project>> {
        match self.projects.get(community_id) {
            Some(Some(projects)) => Ok(projects.clone()),
            Some(None) => Err(CloudError::api(500, "internal error")),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_community(&self, community_id: &str) -> Result<OperationId> {
        self.accept("community", community_id)
    }

    async fn delete_project(&self, project_id: &str) -> Result<OperationId> {
        self.accept("project", project_id)
    }

    async fn get_operation(&self, operation_id: &OperationId) -> Result<OperationStatus> {
        let plan = self
            .operations
            .lock()
            .unwrap()
            .get(operation_id.as_str())
            .copied()
            .ok_or_else(|| CloudError::ResourceNotFound(operation_id.to_string()))?;

        Ok(match plan {
            Plan::Succeed => OperationStatus::succeeded(
                operation_id.as_str(),
                serde_json::json!({"@type": "google.protobuf.Empty"}),
            ),
            Plan::Fail => OperationStatus::failed(operation_id.as_str(), 9, "resource is busy"),
            Plan::Pending => OperationStatus::pending(operation_id.as_str()),
        })
    }
}
