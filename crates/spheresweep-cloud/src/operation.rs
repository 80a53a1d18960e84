//! Asynchronous operation types
//!
//! Every delete call only confirms that the request was accepted and returns
//! an operation id. Completion is learned by polling the operation service.

use serde::{Deserialize, Serialize};

/// Id of a server-side asynchronous operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status payload returned by the operation service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub id: String,

    /// Whether the operation reached a terminal state
    #[serde(default)]
    pub done: bool,

    /// Operation result, present once `done` is true and no error occurred
    #[serde(default)]
    pub response: Option<serde_json::Value>,

    /// Terminal error payload
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl OperationStatus {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn succeeded(id: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            done: true,
            response: Some(response),
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: true,
            response: None,
            error: Some(OperationError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Error payload of a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}
