pub mod builder;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod path_io;
pub mod profile;
pub mod vocabulary;
pub mod types {
    pub mod path_data;
}
pub mod parsing {
    pub mod wordlist_parser;
}
pub mod selection {
    pub mod optimizer;
    pub mod policy;
    pub mod scoring;
}

pub use builder::{PathBuilder, Strategy};
pub use error::{PathError, Result};
pub use hierarchy::{HierarchyConfig, Level, LevelHierarchy, Progression, ProgressionKind};
pub use profile::{DifficultyCategory, ItemProfile, LevelStats, VocabularyProfiler};
pub use selection::optimizer::PathOptimizer;
pub use selection::policy::{ScoringWeights, SelectionPolicy};
pub use types::path_data::{ItemEvaluation, LevelSelectionResult, PathResult, StopReason};
pub use vocabulary::{ItemVocabulary, TargetVocabulary, VocabularyMapping};
