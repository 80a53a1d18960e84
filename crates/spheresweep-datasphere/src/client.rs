//! Datasphere REST client
//!
//! Direct implementation of [`DatasphereApi`] over the Datasphere v2 and
//! operation service REST APIs. Requests carry an IAM token as Bearer auth.

use crate::error::{DatasphereError, Result};
use crate::iam;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use spheresweep_cloud::{Community, DatasphereApi, OperationId, OperationStatus, Project};

const DEFAULT_IAM_BASE: &str = "https://iam.api.cloud-preprod.yandex.net";
const DEFAULT_DATASPHERE_BASE: &str = "https://datasphere.api.cloud-preprod.yandex.net/datasphere/v2";
const DEFAULT_OPERATIONS_BASE: &str = "https://operation.api.cloud-preprod.yandex.net/operations";

/// Base URLs of the services the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub iam: String,
    pub datasphere: String,
    pub operations: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            iam: DEFAULT_IAM_BASE.to_string(),
            datasphere: DEFAULT_DATASPHERE_BASE.to_string(),
            operations: DEFAULT_OPERATIONS_BASE.to_string(),
        }
    }
}

impl Endpoints {
    fn communities_url(&self) -> String {
        format!("{}/communities", self.datasphere.trim_end_matches('/'))
    }

    fn community_url(&self, community_id: &str) -> String {
        format!("{}/{}", self.communities_url(), community_id)
    }

    fn projects_url(&self) -> String {
        format!("{}/projects", self.datasphere.trim_end_matches('/'))
    }

    fn project_url(&self, project_id: &str) -> String {
        format!("{}/{}", self.projects_url(), project_id)
    }

    fn operation_url(&self, operation_id: &OperationId) -> String {
        format!("{}/{}", self.operations.trim_end_matches('/'), operation_id)
    }
}

/// Datasphere client
pub struct DatasphereClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    iam_token: String,
}

impl DatasphereClient {
    /// Exchange `oauth_token` for an IAM token and create a client
    pub async fn connect(endpoints: Endpoints, oauth_token: &str) -> Result<Self> {
        let client = reqwest::Client::new();
        let iam_token = iam::exchange_oauth_token(&client, &endpoints.iam, oauth_token).await?;

        tracing::debug!("Obtained IAM token");

        Ok(Self {
            client,
            endpoints,
            iam_token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.iam_token)
            .query(query)
            .send()
            .await?;

        read_json(response).await
    }

    async fn delete(&self, url: &str) -> Result<OperationId> {
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.iam_token)
            .send()
            .await?;

        let accepted: AcceptedOperation = read_json(response).await?;
        Ok(OperationId::new(accepted.id))
    }

    /// Fetch every page of a paginated listing
    async fn list_all<P: Page>(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        let mut page_token = String::new();

        loop {
            let page: P = {
                let mut params = query.to_vec();
                if !page_token.is_empty() {
                    params.push(("pageToken", page_token.as_str()));
                }
                self.get_json(url, &params).await?
            };
            let (mut page_items, next) = page.into_parts();
            items.append(&mut page_items);

            match next {
                Some(token) if !token.is_empty() => page_token = token,
                _ => break,
            }
        }

        Ok(items)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(DatasphereError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl DatasphereApi for DatasphereClient {
    async fn list_communities(
        &self,
        organization_id: &str,
        name_filter: &str,
    ) -> spheresweep_cloud::Result<Vec<Community>> {
        let url = self.endpoints.communities_url();
        let mut query = vec![("organizationId", organization_id)];
        if !name_filter.is_empty() {
            query.push(("nameOrDescriptionPattern", name_filter));
        }

        let communities = self.list_all::<CommunitiesPage>(&url, &query).await?;
        tracing::debug!(
            "Listed {} communities in organization {}",
            communities.len(),
            organization_id
        );
        Ok(communities)
    }

    async fn list_projects(&self, community_id: &str) -> spheresweep_cloud::Result<Vec<Project>> {
        let url = self.endpoints.projects_url();
        let projects = self
            .list_all::<ProjectsPage>(&url, &[("communityId", community_id)])
            .await?;
        Ok(projects)
    }

    async fn delete_community(&self, community_id: &str) -> spheresweep_cloud::Result<OperationId> {
        Ok(self.delete(&self.endpoints.community_url(community_id)).await?)
    }

    async fn delete_project(&self, project_id: &str) -> spheresweep_cloud::Result<OperationId> {
        Ok(self.delete(&self.endpoints.project_url(project_id)).await?)
    }

    async fn get_operation(
        &self,
        operation_id: &OperationId,
    ) -> spheresweep_cloud::Result<OperationStatus> {
        let status: OperationStatus = self
            .get_json(&self.endpoints.operation_url(operation_id), &[])
            .await?;
        Ok(status)
    }
}

// ============ API Types ============

trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommunitiesPage {
    #[serde(default)]
    communities: Vec<Community>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl Page for CommunitiesPage {
    type Item = Community;

    fn into_parts(self) -> (Vec<Community>, Option<String>) {
        (self.communities, self.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectsPage {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl Page for ProjectsPage {
    type Item = Project;

    fn into_parts(self) -> (Vec<Project>, Option<String>) {
        (self.projects, self.next_page_token)
    }
}

/// Immediate response of an accepted delete request
#[derive(Debug, Deserialize)]
struct AcceptedOperation {
    #[serde(alias = "Id")]
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints {
            iam: "http://iam.local".to_string(),
            datasphere: "http://ds.local/datasphere/v2/".to_string(),
            operations: "http://ops.local/operations".to_string(),
        }
    }

    #[test]
    fn test_resource_urls() {
        let endpoints = endpoints();

        assert_eq!(
            endpoints.community_url("c-1"),
            "http://ds.local/datasphere/v2/communities/c-1"
        );
        assert_eq!(
            endpoints.project_url("p-1"),
            "http://ds.local/datasphere/v2/projects/p-1"
        );
        assert_eq!(
            endpoints.operation_url(&OperationId::new("op-1")),
            "http://ops.local/operations/op-1"
        );
    }

    #[test]
    fn test_communities_page() {
        let page: CommunitiesPage = serde_json::from_str(
            r#"{"communities":[{"id":"c-1","name":"tmp-a"},{"id":"c-2","name":"tmp-b"}],"nextPageToken":"abc"}"#,
        )
        .unwrap();

        let (items, next) = page.into_parts();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "c-2");
        assert_eq!(next.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_projects_page() {
        let page: ProjectsPage = serde_json::from_str("{}").unwrap();

        let (items, next) = page.into_parts();
        assert!(items.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_accepted_operation_id_casing() {
        let lower: AcceptedOperation = serde_json::from_str(r#"{"id":"op-1","done":false}"#).unwrap();
        let upper: AcceptedOperation = serde_json::from_str(r#"{"Id":"op-2"}"#).unwrap();

        assert_eq!(lower.id, "op-1");
        assert_eq!(upper.id, "op-2");
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert!(endpoints.datasphere.ends_with("/datasphere/v2"));
        assert!(endpoints.operations.ends_with("/operations"));
    }
}
