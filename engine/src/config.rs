use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::build::BuildKind;
use crate::error::EngineError;

pub const DEFAULT_MAX_BUILDS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SessionConfig {
    /// Most builds compared at once; ids run `1..=max_builds`.
    pub max_builds: u32,
    /// Key the build set is persisted under.
    pub storage_key: String,
    /// Kind of the build created when nothing was stored.
    pub default_kind: BuildKind,
    /// Cap on undo depth; unlimited when absent.
    pub history_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_builds: DEFAULT_MAX_BUILDS,
            storage_key: "builds".to_string(),
            default_kind: BuildKind::Weapon,
            history_limit: None,
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, EngineError> {
        let cfg: Self = serde_yaml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        cfg.validated()
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, EngineError> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        cfg.validated()
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let cfg = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        };
        cfg.with_context(|| format!("failed to parse config: {}", path.display()))
    }

    fn validated(self) -> std::result::Result<Self, EngineError> {
        if self.max_builds == 0 {
            return Err(EngineError::Config("max_builds must be at least 1".to_string()));
        }
        if self.storage_key.trim().is_empty() {
            return Err(EngineError::Config("storage_key must not be empty".to_string()));
        }
        Ok(self)
    }
}
