//! Datasphere API trait definition

use crate::error::Result;
use crate::operation::{OperationId, OperationStatus};
use crate::resource::{Community, Project};
use async_trait::async_trait;

/// Remote management API consumed by the deletion engine
///
/// Delete calls are asynchronous on the server side: a successful return only
/// means the request was accepted. The returned [`OperationId`] must be polled
/// through [`get_operation`](DatasphereApi::get_operation) to learn the outcome.
#[async_trait]
pub trait DatasphereApi: Send + Sync {
    /// List communities of an organization whose name or description matches
    /// `name_filter`
    async fn list_communities(
        &self,
        organization_id: &str,
        name_filter: &str,
    ) -> Result<Vec<Community>>;

    /// List projects of a community
    async fn list_projects(&self, community_id: &str) -> Result<Vec<Project>>;

    async fn delete_community(&self, community_id: &str) -> Result<OperationId>;

    async fn delete_project(&self, project_id: &str) -> Result<OperationId>;

    /// Fetch the current status of an asynchronous operation
    async fn get_operation(&self, operation_id: &OperationId) -> Result<OperationStatus>;
}

#[async_trait]
impl<T: DatasphereApi + ?Sized> DatasphereApi for std::sync::Arc<T> {
    async fn list_communities(
        &self,
        organization_id: &str,
        name_filter: &str,
    ) -> Result<Vec<Community>> {
        (**self).list_communities(organization_id, name_filter).await
    }

    async fn list_projects(&self, community_id: &str) -> Result<Vec<Project>> {
        (**self).list_projects(community_id).await
    }

    async fn delete_community(&self, community_id: &str) -> Result<OperationId> {
        (**self).delete_community(community_id).await
    }

    async fn delete_project(&self, project_id: &str) -> Result<OperationId> {
        (**self).delete_project(project_id).await
    }

    async fn get_operation(&self, operation_id: &OperationId) -> Result<OperationStatus> {
        (**self).get_operation(operation_id).await
    }
}
