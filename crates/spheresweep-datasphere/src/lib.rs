//! Datasphere client for spheresweep
//!
//! Implements [`spheresweep_cloud::DatasphereApi`] over the Datasphere v2
//! REST API and the operation service.
//!
//! # Requirements
//!
//! - An OAuth token, exchanged for an IAM token through the IAM service
//!
//! # Example
//!
//! ```ignore
//! use spheresweep_cloud::DatasphereApi;
//! use spheresweep_datasphere::{DatasphereClient, Endpoints};
//!
//! let client = DatasphereClient::connect(Endpoints::default(), &oauth_token).await?;
//!
//! for community in client.list_communities("org-id", "tmp-").await? {
//!     let projects = client.list_projects(&community.id).await?;
//!     println!("{} has {} projects", community, projects.len());
//! }
//! ```

pub mod client;
pub mod error;
pub mod iam;

pub use client::{DatasphereClient, Endpoints};
pub use error::{DatasphereError, Result};
