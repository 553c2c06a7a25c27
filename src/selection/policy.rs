use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PathError, Result};
use crate::hierarchy::LevelHierarchy;

pub const DEFAULT_MAX_BOOKS: usize = 2;
pub const DEFAULT_TARGET_COVERAGE: f64 = 0.8;

const CEFR_LEVELS: [&str; 5] = ["A1", "A2", "B1", "B2", "C1"];

/// Coefficients of the greedy scoring function. The defaults are the tuned
/// values every preset uses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Per target word not yet covered.
    pub new_word: f64,
    /// Per word at an easier level.
    pub review: f64,
    /// Per word at the next harder level, up to `preview_cap` words.
    pub preview: f64,
    pub preview_cap: usize,
    /// Subtracted per overflow word.
    pub overflow_penalty: f64,
    /// Scales the share of the remaining target an item covers.
    pub efficiency: f64,
    /// The efficiency bonus applies only once the iteration counter exceeds this.
    pub efficiency_after_iteration: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            new_word: 10.0,
            review: 0.5,
            preview: 0.1,
            preview_cap: 100,
            overflow_penalty: 0.8,
            efficiency: 50.0,
            efficiency_after_iteration: 2,
        }
    }
}

/// Thresholds governing candidate filtering and loop termination.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SelectionPolicy {
    pub max_books: BTreeMap<String, usize>,
    pub target_coverage: BTreeMap<String, f64>,
    pub max_overflow: f64,
    pub min_relevance: f64,
    pub min_target_words: usize,
    pub scoring: ScoringWeights,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_books: BTreeMap::new(),
            target_coverage: BTreeMap::new(),
            max_overflow: 0.15,
            min_relevance: 0.4,
            min_target_words: 30,
            scoring: ScoringWeights::default(),
        }
    }
}

impl SelectionPolicy {
    // --- Builders ---

    pub fn with_max_books(mut self, level: &str, cap: usize) -> Self {
        self.max_books.insert(level.to_string(), cap);
        self
    }

    pub fn with_target_coverage(mut self, level: &str, ratio: f64) -> Self {
        self.target_coverage.insert(level.to_string(), ratio);
        self
    }

    pub fn with_max_overflow(mut self, ratio: f64) -> Self {
        self.max_overflow = ratio;
        self
    }

    pub fn with_min_relevance(mut self, ratio: f64) -> Self {
        self.min_relevance = ratio;
        self
    }

    pub fn with_min_target_words(mut self, count: usize) -> Self {
        self.min_target_words = count;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringWeights) -> Self {
        self.scoring = scoring;
        self
    }

    // --- Presets ---

    /// The CEFR A1..C1 tuning.
    pub fn cefr_defaults() -> Self {
        let caps = [3, 3, 4, 3, 2];
        let coverage = [0.85, 0.9, 0.9, 0.9, 0.9];
        let mut policy = Self::default();
        for (i, level) in CEFR_LEVELS.iter().enumerate() {
            policy.max_books.insert(level.to_string(), caps[i]);
            policy.target_coverage.insert(level.to_string(), coverage[i]);
        }
        policy
    }

    /// More books per level, strict overflow and relevance filters.
    pub fn conservative<S: AsRef<str>>(levels: &[S]) -> Self {
        Self::per_rank(
            levels,
            |i| if i < 2 { 4 } else if i < 4 { 3 } else { 2 },
            |i| if i < 3 { 0.9 } else { 0.8 },
        )
        .with_max_overflow(0.10)
        .with_min_relevance(0.60)
        .with_min_target_words(50)
    }

    pub fn standard<S: AsRef<str>>(levels: &[S]) -> Self {
        Self::per_rank(
            levels,
            |i| match i {
                0 | 1 | 3 => 3,
                2 => 4,
                _ => 2,
            },
            |i| if i == 0 { 0.85 } else { 0.9 },
        )
        .with_max_overflow(0.15)
        .with_min_relevance(0.40)
        .with_min_target_words(30)
    }

    /// Fewer books, looser filters, lower coverage goals.
    pub fn fast<S: AsRef<str>>(levels: &[S]) -> Self {
        Self::per_rank(
            levels,
            |i| if i < 1 { 2 } else { 3 },
            |i| {
                if i < 2 {
                    0.75
                } else if i < 3 {
                    0.8
                } else {
                    0.85
                }
            },
        )
        .with_max_overflow(0.25)
        .with_min_relevance(0.30)
        .with_min_target_words(10)
    }

    fn per_rank<S, C, T>(levels: &[S], cap: C, coverage: T) -> Self
    where
        S: AsRef<str>,
        C: Fn(usize) -> usize,
        T: Fn(usize) -> f64,
    {
        let mut policy = Self::default();
        for (i, level) in levels.iter().enumerate() {
            policy.max_books.insert(level.as_ref().to_string(), cap(i));
            policy.target_coverage.insert(level.as_ref().to_string(), coverage(i));
        }
        policy
    }

    /// True when `names` is exactly the CEFR ladder the defaults are tuned for.
    pub fn is_cefr_ladder<S: AsRef<str>>(names: &[S]) -> bool {
        names.len() == CEFR_LEVELS.len()
            && names.iter().zip(CEFR_LEVELS).all(|(n, c)| n.as_ref() == c)
    }

    // --- Lookups ---

    pub fn max_books_for(&self, level: &str) -> usize {
        self.max_books.get(level).copied().unwrap_or(DEFAULT_MAX_BOOKS)
    }

    pub fn target_coverage_for(&self, level: &str) -> f64 {
        self.target_coverage.get(level).copied().unwrap_or(DEFAULT_TARGET_COVERAGE)
    }

    /// Upper bound on the path length over every level of `hierarchy`.
    pub fn total_max_books(&self, hierarchy: &LevelHierarchy) -> usize {
        hierarchy.levels().iter().map(|l| self.max_books_for(&l.name)).sum()
    }

    /// Checks ratios, caps and level keys against `hierarchy`.
    pub fn validate(&self, hierarchy: &LevelHierarchy) -> Result<()> {
        check_ratio("max_overflow", self.max_overflow)?;
        check_ratio("min_relevance", self.min_relevance)?;
        if self.min_target_words == 0 {
            return Err(PathError::NonPositiveMinTargetWords);
        }

        for (level, &cap) in &self.max_books {
            hierarchy.index(level)?;
            if cap == 0 {
                return Err(PathError::NonPositiveBookCap { level: level.clone(), value: cap });
            }
        }
        for (level, &ratio) in &self.target_coverage {
            hierarchy.index(level)?;
            check_ratio(&format!("target_coverage[{}]", level), ratio)?;
        }

        if self.min_relevance + self.max_overflow > 1.0 {
            warn!(
                "min_relevance ({}) + max_overflow ({}) exceeds 1.0; the candidate filter may be inconsistent.",
                self.min_relevance, self.max_overflow
            );
        }
        Ok(())
    }
}

fn check_ratio(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PathError::ratio(field, value))
    }
}
