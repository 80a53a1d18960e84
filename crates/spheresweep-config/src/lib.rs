pub mod error;

pub use error::*;

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const AUTH_TOKEN_VAR: &str = "AUTH_TOKEN";
pub const ORGANIZATION_ID_VAR: &str = "ORGANIZATION_ID";
pub const COMMUNITY_FILTER_VAR: &str = "COMMUNITY_SUBSTR";
pub const CONFIG_PATH_VAR: &str = "SPHERESWEEP_CONFIG_PATH";

/// Load `.env` from the current directory (or a parent) into the environment
///
/// Variables already set in the environment win. Returns the loaded file, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Credentials and target of a sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth token exchanged for an IAM token
    pub auth_token: String,
    pub organization_id: String,
    /// Substring matched against community names and descriptions
    pub community_filter: String,
}

impl Credentials {
    /// Build credentials from values that may be missing
    ///
    /// The community filter is required as well: an empty filter would match
    /// every community of the organization, so it has to be set explicitly.
    pub fn from_parts(
        auth_token: Option<String>,
        organization_id: Option<String>,
        community_filter: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            auth_token: non_empty(auth_token).ok_or(ConfigError::MissingSetting(AUTH_TOKEN_VAR))?,
            organization_id: non_empty(organization_id)
                .ok_or(ConfigError::MissingSetting(ORGANIZATION_ID_VAR))?,
            community_filter: community_filter
                .ok_or(ConfigError::MissingSetting(COMMUNITY_FILTER_VAR))?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Service base URL overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointsConfig {
    pub iam: Option<String>,
    pub datasphere: Option<String>,
    pub operations: Option<String>,
}

/// Tuning overrides of one deletion stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    pub pacing_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub poll_initial_delay_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
}

/// Contents of `config.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoints: EndpointsConfig,
    pub projects: StageConfig,
    pub communities: StageConfig,
}

impl FileConfig {
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// spheresweep config directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("spheresweep");

    Ok(config_dir)
}

/// Locate the optional config file
///
/// Search order:
/// 1. `SPHERESWEEP_CONFIG_PATH` (direct path)
/// 2. `./spheresweep.yaml`
/// 3. `~/.config/spheresweep/config.yaml`
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let local = current_dir.join("spheresweep.yaml");
        if local.exists() {
            return Some(local);
        }
    }

    let global = get_config_dir().ok()?.join("config.yaml");
    global.exists().then_some(global)
}

/// Load the config file, or defaults when there is none
pub fn load_file_config() -> Result<FileConfig> {
    match find_config_file() {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            FileConfig::from_yaml(&path, &content)
        }
        None => Ok(FileConfig::default()),
    }
}
