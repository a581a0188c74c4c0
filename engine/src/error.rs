use thiserror::Error;

use crate::build::BuildKind;

/// Failures surfaced to the user. Numeric evaluation never produces these;
/// only structural edits, bad field paths, imports and storage do.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot remove the last remaining build")]
    LastBuild,
    #[error("cannot remove the last remaining spell power profile")]
    LastProfile,
    #[error("build limit reached ({max} builds)")]
    BuildLimit { max: u32 },
    #[error("no build with id {0}")]
    UnknownBuild(u32),
    #[error("no spell power profile with id {0}")]
    UnknownProfile(u32),
    #[error("no row {key} in {collection}")]
    UnknownRow { collection: &'static str, key: u32 },
    #[error("invalid field `{path}`: {reason}")]
    InvalidField { path: String, reason: String },
    #[error("build {id} is not a {expected} build")]
    WrongBuildKind { id: u32, expected: BuildKind },
    #[error("import rejected: {0}")]
    MalformedImport(String),
    #[error("storage error: {0}")]
    Store(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Structural violations leave state untouched and are shown as notices.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EngineError::LastBuild | EngineError::LastProfile | EngineError::BuildLimit { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
