//! Datasphere resources

use serde::{Deserialize, Serialize};

/// Top-level resource container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,

    #[serde(default)]
    pub name: String,
}

impl Community {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Community {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}

/// Resource owned by exactly one community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,

    /// Owning community id. A lookup key into the logbook, nothing more.
    pub community_id: String,

    #[serde(default)]
    pub name: String,
}

impl Project {
    pub fn new(
        id: impl Into<String>,
        community_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            community_id: community_id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_deserialize_camel_case() {
        let project: Project = serde_json::from_str(
            r#"{"id":"p-1","communityId":"c-1","name":"scratch","createdAt":"2024-01-01"}"#,
        )
        .unwrap();

        assert_eq!(project, Project::new("p-1", "c-1", "scratch"));
    }

    #[test]
    fn test_community_display() {
        assert_eq!(Community::new("c-1", "").to_string(), "c-1");
        assert_eq!(Community::new("c-1", "ml-lab").to_string(), "c-1 (ml-lab)");
    }
}
