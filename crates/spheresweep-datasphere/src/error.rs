//! Datasphere client error types

use spheresweep_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasphereError {
    #[error("IAM token exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },

    #[error("IAM response did not contain an iamToken")]
    MissingIamToken,

    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<DatasphereError> for CloudError {
    fn from(err: DatasphereError) -> Self {
        match err {
            DatasphereError::TokenExchange { .. } | DatasphereError::MissingIamToken => {
                CloudError::AuthenticationFailed(err.to_string())
            }
            DatasphereError::Status { status, body } => CloudError::api(status, body),
            DatasphereError::Http(e) => CloudError::Transport(e.to_string()),
            DatasphereError::JsonError(e) => CloudError::Json(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasphereError>;
