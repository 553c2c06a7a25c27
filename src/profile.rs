use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PathError, Result};
use crate::hierarchy::LevelHierarchy;
use crate::vocabulary::{ItemVocabulary, VocabularyMapping};

/// Suitability at or above which a level is recommended for an item.
pub const RECOMMENDED_SUITABILITY: f64 = 0.6;

/// The words of one item that fall into one level bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    pub level: String,
    pub words: BTreeSet<String>,
    pub count: usize,
    /// Share of the item's whole vocabulary.
    pub ratio: f64,
    /// count x level weight; always 0 for the overflow bucket.
    pub weighted_value: f64,
}

impl LevelStats {
    fn empty(level: &str) -> Self {
        Self {
            level: level.to_string(),
            words: BTreeSet::new(),
            count: 0,
            ratio: 0.0,
            weighted_value: 0.0,
        }
    }

    fn from_words(level: &str, words: BTreeSet<String>, total_words: usize, weight: f64) -> Self {
        let count = words.len();
        Self {
            level: level.to_string(),
            words,
            count,
            ratio: count as f64 / total_words as f64,
            weighted_value: count as f64 * weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelScore {
    pub level: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyCategory {
    Beginner,
    Intermediate,
    Advanced,
}

/// Vocabulary-difficulty profile of one item. Computed once, read-only after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemProfile {
    pub item_id: String,
    pub total_words: usize,
    /// One entry per hierarchy level, in rank order.
    pub levels: Vec<LevelStats>,
    pub overflow: LevelStats,
    pub difficulty_score: f64,
    pub learning_value: f64,
    /// Fraction of the whole item drawn from each level and every easier one.
    pub suitability: Vec<LevelScore>,
    pub learning_words_ratio: f64,
}

impl ItemProfile {
    pub fn level_stats(&self, rank: usize) -> Option<&LevelStats> {
        self.levels.get(rank)
    }

    pub fn count_at(&self, rank: usize) -> usize {
        self.levels.get(rank).map_or(0, |s| s.count)
    }

    pub fn words_at(&self, rank: usize) -> Option<&BTreeSet<String>> {
        self.levels.get(rank).map(|s| &s.words)
    }

    pub fn suitability_at(&self, rank: usize) -> f64 {
        self.suitability.get(rank).map_or(0.0, |s| s.score)
    }

    /// Looks up a bucket by name, including the overflow bucket.
    pub fn stats_for(&self, level: &str) -> Option<&LevelStats> {
        if self.overflow.level == level {
            return Some(&self.overflow);
        }
        self.levels.iter().find(|s| s.level == level)
    }

    pub fn suitability_for(&self, level: &str) -> Option<f64> {
        self.suitability.iter().find(|s| s.level == level).map(|s| s.score)
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow.count
    }

    pub fn overflow_ratio(&self) -> f64 {
        self.overflow.ratio
    }

    pub fn difficulty_category(&self) -> DifficultyCategory {
        if self.difficulty_score < 2.0 {
            DifficultyCategory::Beginner
        } else if self.difficulty_score < 4.0 {
            DifficultyCategory::Intermediate
        } else {
            DifficultyCategory::Advanced
        }
    }

    pub fn recommended_levels(&self) -> Vec<&str> {
        self.suitability
            .iter()
            .filter(|s| s.score >= RECOMMENDED_SUITABILITY)
            .map(|s| s.level.as_str())
            .collect()
    }
}

/// Mapping partitioned against the hierarchy.
#[derive(Debug, Clone)]
struct LevelVocabulary {
    /// Only words whose level is configured.
    rank_of: HashMap<String, usize>,
    /// Every mapped word, configured level or not.
    known: HashSet<String>,
    level_sizes: Vec<usize>,
}

/// Computes per-item vocabulary profiles against a level hierarchy.
#[derive(Debug, Clone)]
pub struct VocabularyProfiler {
    hierarchy: LevelHierarchy,
    vocabulary: Option<LevelVocabulary>,
}

impl VocabularyProfiler {
    pub fn new(hierarchy: LevelHierarchy) -> Self {
        Self { hierarchy, vocabulary: None }
    }

    pub fn hierarchy(&self) -> &LevelHierarchy {
        &self.hierarchy
    }

    pub fn is_initialized(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Partitions `mapping` by level. Replaces any mapping set earlier.
    pub fn set_mapping(&mut self, mapping: &VocabularyMapping) {
        let mut rank_of = HashMap::new();
        let mut known = HashSet::with_capacity(mapping.len());
        let mut level_sizes = vec![0; self.hierarchy.level_count()];

        for (word, level) in mapping.iter() {
            known.insert(word.to_string());
            if let Ok(rank) = self.hierarchy.index(level) {
                rank_of.insert(word.to_string(), rank);
                level_sizes[rank] += 1;
            }
        }

        info!(
            "Learning vocabulary grouped into {} levels ({} mapped words).",
            self.hierarchy.level_count(),
            known.len()
        );
        for level in self.hierarchy.levels() {
            info!("  {}: {} words", level.name, level_sizes[level.rank]);
        }

        self.vocabulary = Some(LevelVocabulary { rank_of, known, level_sizes });
    }

    /// Number of mapped words per configured level, in rank order.
    pub fn level_vocabulary_sizes(&self) -> Result<Vec<(String, usize)>> {
        let vocabulary = self.vocabulary()?;
        Ok(self
            .hierarchy
            .levels()
            .iter()
            .map(|l| (l.name.clone(), vocabulary.level_sizes[l.rank]))
            .collect())
    }

    fn vocabulary(&self) -> Result<&LevelVocabulary> {
        self.vocabulary.as_ref().ok_or(PathError::ProfilerNotInitialized)
    }

    pub fn profile_item(&self, item: &ItemVocabulary) -> Result<ItemProfile> {
        self.profile(&item.id, &item.words)
    }

    pub fn profile_all(&self, items: &[ItemVocabulary]) -> Result<Vec<ItemProfile>> {
        items.iter().map(|item| self.profile_item(item)).collect()
    }

    pub fn profile(&self, item_id: &str, words: &BTreeSet<String>) -> Result<ItemProfile> {
        let vocabulary = self.vocabulary()?;
        if words.is_empty() {
            debug!("Item '{}' has no vocabulary; using a zero profile.", item_id);
            return Ok(self.empty_profile(item_id));
        }

        let total_words = words.len();
        let level_count = self.hierarchy.level_count();

        let mut buckets: Vec<BTreeSet<String>> = vec![BTreeSet::new(); level_count];
        let mut overflow_words = BTreeSet::new();
        for word in words {
            if let Some(&rank) = vocabulary.rank_of.get(word) {
                buckets[rank].insert(word.clone());
            } else if !vocabulary.known.contains(word) {
                // Overflow is measured against the raw mapping keys, so words
                // mapped to an unconfigured level are neither here nor in a bucket.
                overflow_words.insert(word.clone());
            }
        }

        let levels: Vec<LevelStats> = self
            .hierarchy
            .levels()
            .iter()
            .zip(buckets)
            .map(|(level, bucket)| LevelStats::from_words(&level.name, bucket, total_words, level.weight))
            .collect();
        let overflow = LevelStats::from_words(self.hierarchy.overflow_level(), overflow_words, total_words, 0.0);

        let total = total_words as f64;
        let overflow_penalty = self.hierarchy.max_multiplier() + 1.0;
        let difficulty_sum: f64 = self
            .hierarchy
            .levels()
            .iter()
            .map(|l| levels[l.rank].count as f64 * l.multiplier)
            .sum::<f64>()
            + overflow.count as f64 * overflow_penalty;
        let learning_sum: f64 = levels.iter().map(|s| s.weighted_value).sum();
        let learning_count: usize = levels.iter().map(|s| s.count).sum();

        let mut cumulative = 0usize;
        let suitability = levels
            .iter()
            .map(|s| {
                cumulative += s.count;
                LevelScore { level: s.level.clone(), score: cumulative as f64 / total }
            })
            .collect();

        let profile = ItemProfile {
            item_id: item_id.to_string(),
            total_words,
            levels,
            overflow,
            difficulty_score: difficulty_sum / total,
            learning_value: learning_sum / total,
            suitability,
            learning_words_ratio: learning_count as f64 / total,
        };
        debug!(
            "Profiled '{}': {} words, difficulty {:.2}, learning value {:.2}, overflow {:.1}%",
            item_id,
            total_words,
            profile.difficulty_score,
            profile.learning_value,
            profile.overflow_ratio() * 100.0
        );
        Ok(profile)
    }

    /// Suitability of a word set for one level, without building a profile.
    pub fn suitability_for(&self, words: &BTreeSet<String>, level: &str) -> Result<f64> {
        let vocabulary = self.vocabulary()?;
        let target_rank = self.hierarchy.index(level)?;
        if words.is_empty() {
            return Ok(0.0);
        }
        let understandable = words
            .iter()
            .filter(|w| vocabulary.rank_of.get(*w).is_some_and(|&rank| rank <= target_rank))
            .count();
        Ok(understandable as f64 / words.len() as f64)
    }

    fn empty_profile(&self, item_id: &str) -> ItemProfile {
        let levels = self.hierarchy.levels();
        ItemProfile {
            item_id: item_id.to_string(),
            total_words: 0,
            levels: levels.iter().map(|l| LevelStats::empty(&l.name)).collect(),
            overflow: LevelStats::empty(self.hierarchy.overflow_level()),
            difficulty_score: 0.0,
            learning_value: 0.0,
            suitability: levels
                .iter()
                .map(|l| LevelScore { level: l.name.clone(), score: 0.0 })
                .collect(),
            learning_words_ratio: 0.0,
        }
    }
}
