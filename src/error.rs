use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or running a reading-path build.
///
/// Degenerate inputs (an item with no words, a level without candidates,
/// a level whose target is already covered) are reported inside the results
/// and never surface here.
#[derive(Debug, Error)]
pub enum PathError {
    // --- Configuration ---
    #[error("level hierarchy must contain at least one level")]
    EmptyHierarchy,

    #[error("duplicate level name '{0}' in hierarchy")]
    DuplicateLevel(String),

    #[error("weight for level '{level}' must be positive, got {value}")]
    NonPositiveWeight { level: String, value: f64 },

    #[error("custom progression requires a multiplier for level '{0}'")]
    MissingCustomRule(String),

    #[error("overflow level name '{0}' collides with a configured level")]
    OverflowLevelCollision(String),

    #[error("{field} must be within [0, 1], got {value}")]
    RatioOutOfRange { field: String, value: f64 },

    #[error("max_books for level '{level}' must be positive, got {value}")]
    NonPositiveBookCap { level: String, value: usize },

    #[error("min_target_words must be positive")]
    NonPositiveMinTargetWords,

    // --- Usage order ---
    #[error("vocabulary mapping has not been set; call set_mapping before profiling")]
    ProfilerNotInitialized,

    // --- Lookup ---
    #[error("unknown level '{0}'")]
    UnknownLevel(String),

    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("unknown strategy '{0}' (expected conservative, standard or fast)")]
    UnknownStrategy(String),

    // --- Input / output glue ---
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, PathError>;

impl PathError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PathError::Io { path: path.into(), source }
    }

    pub(crate) fn ratio(field: impl Into<String>, value: f64) -> Self {
        PathError::RatioOutOfRange { field: field.into(), value }
    }
}
