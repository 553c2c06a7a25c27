use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::profile::DifficultyCategory;

/// Why the greedy loop for a level stopped.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    BookCap,
    TargetCoverageReached,
    /// Every target word at the level is now covered.
    VocabularyExhausted,
    CandidatesExhausted,
    /// Candidates remained but none of them adds a target word.
    NoContributingCandidate,
    /// Nothing passed the candidate filter.
    NoCandidates,
    /// Earlier levels already covered the whole target (or it is empty).
    TargetAlreadyCovered,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LevelSelectionResult {
    pub level: String,
    /// Selection order within the level.
    pub items: Vec<String>,
    pub coverage: f64,
    pub newly_covered: BTreeSet<String>,
    pub target_words: usize,
    pub covered_words: usize,
    pub candidate_count: usize,
    pub stop_reason: StopReason,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CoverageStat {
    pub level: String,
    pub covered: usize,
    pub total: usize,
    pub ratio: f64,
}

/// Coverage of every level's target, measured after one level was processed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CoverageSnapshot {
    pub after_level: String,
    pub levels: Vec<CoverageStat>,
}

impl CoverageSnapshot {
    pub fn ratio_for(&self, level: &str) -> Option<f64> {
        self.levels.iter().find(|s| s.level == level).map(|s| s.ratio)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LevelDifficulty {
    pub level: String,
    /// Rounded to two decimals.
    pub average_difficulty: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PathSummary {
    pub total_items: usize,
    pub items_per_level: Vec<LevelCount>,
    pub final_coverage: Vec<CoverageStat>,
    /// Only levels that selected at least one item appear here.
    pub difficulty_progression: Vec<LevelDifficulty>,
    pub recommended_order: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PathResult {
    pub levels: Vec<LevelSelectionResult>,
    pub selected_items: Vec<String>,
    pub cumulative_coverage: Vec<CoverageSnapshot>,
    pub summary: PathSummary,
}

impl PathResult {
    pub fn level(&self, name: &str) -> Option<&LevelSelectionResult> {
        self.levels.iter().find(|l| l.level == name)
    }

    pub fn coverage_after(&self, level: &str) -> Option<&CoverageSnapshot> {
        self.cumulative_coverage.iter().find(|s| s.after_level == level)
    }

    pub fn total_items(&self) -> usize {
        self.selected_items.len()
    }
}

/// How well one item fits one level, derived from its profile.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItemEvaluation {
    pub item_id: String,
    pub level: String,
    pub suitability: f64,
    pub level_word_count: usize,
    pub best_fit_level: String,
    pub best_fit_suitability: f64,
    pub difficulty_score: f64,
    pub difficulty_category: DifficultyCategory,
    pub learning_value: f64,
    pub overflow_ratio: f64,
    pub high_overflow: bool,
    pub high_learning_value: bool,
    pub recommended_levels: Vec<String>,
}
