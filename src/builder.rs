use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PathError, Result};
use crate::hierarchy::LevelHierarchy;
use crate::profile::{ItemProfile, VocabularyProfiler};
use crate::selection::optimizer::PathOptimizer;
use crate::selection::policy::SelectionPolicy;
use crate::types::path_data::{ItemEvaluation, PathResult};
use crate::vocabulary::{ItemVocabulary, TargetVocabulary, VocabularyMapping};

/// Above this overflow ratio an item is flagged as hard going.
pub const HIGH_OVERFLOW_RATIO: f64 = 0.2;
/// Above this learning value an item is flagged as worthwhile.
pub const HIGH_LEARNING_VALUE: f64 = 1.0;

/// Named policy variants run side by side by [`PathBuilder::alternative_paths`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Conservative,
    Standard,
    Fast,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Conservative, Strategy::Standard, Strategy::Fast];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Conservative => "conservative",
            Strategy::Standard => "standard",
            Strategy::Fast => "fast",
        }
    }

    pub fn policy(&self, hierarchy: &LevelHierarchy) -> SelectionPolicy {
        let names = hierarchy.names();
        match self {
            Strategy::Conservative => SelectionPolicy::conservative(&names),
            Strategy::Standard => SelectionPolicy::standard(&names),
            Strategy::Fast => SelectionPolicy::fast(&names),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(Strategy::Conservative),
            "standard" => Ok(Strategy::Standard),
            "fast" => Ok(Strategy::Fast),
            _ => Err(PathError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Profiles a collection once and builds reading paths over it.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    profiler: VocabularyProfiler,
    /// Ascending item id.
    profiles: Vec<ItemProfile>,
    by_id: HashMap<String, usize>,
    targets: TargetVocabulary,
}

impl PathBuilder {
    /// Profiles `items` against `mapping`; each level's target vocabulary is
    /// every mapped word at that level.
    pub fn new(hierarchy: LevelHierarchy, mapping: &VocabularyMapping, items: Vec<ItemVocabulary>) -> Result<Self> {
        let targets = TargetVocabulary::from_mapping(mapping, &hierarchy);
        let mut profiler = VocabularyProfiler::new(hierarchy);
        profiler.set_mapping(mapping);
        Self::from_profiler(profiler, items, targets)
    }

    /// Uses an already configured profiler. Fails if its mapping was never set.
    pub fn from_profiler(profiler: VocabularyProfiler, items: Vec<ItemVocabulary>, targets: TargetVocabulary) -> Result<Self> {
        if !profiler.is_initialized() {
            return Err(PathError::ProfilerNotInitialized);
        }

        let mut unique: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for item in items {
            if unique.insert(item.id.clone(), item.words).is_some() {
                warn!("Duplicate item id '{}'; keeping the last one.", item.id);
            }
        }
        let items: Vec<ItemVocabulary> =
            unique.into_iter().map(|(id, words)| ItemVocabulary { id, words }).collect();

        info!("Profiling {} items...", items.len());
        let profiles = profiler.profile_all(&items)?;
        let by_id = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.item_id.clone(), i))
            .collect();
        info!("Profiled {} items.", profiles.len());

        Ok(Self { profiler, profiles, by_id, targets })
    }

    pub fn hierarchy(&self) -> &LevelHierarchy {
        self.profiler.hierarchy()
    }

    pub fn profiles(&self) -> &[ItemProfile] {
        &self.profiles
    }

    pub fn targets(&self) -> &TargetVocabulary {
        &self.targets
    }

    pub fn item_ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.item_id.as_str()).collect()
    }

    pub fn profile_of(&self, item_id: &str) -> Result<&ItemProfile> {
        self.by_id
            .get(item_id)
            .map(|&i| &self.profiles[i])
            .ok_or_else(|| PathError::UnknownItem(item_id.to_string()))
    }

    /// Size of each level's target vocabulary, in rank order.
    pub fn level_vocabulary_sizes(&self) -> Vec<(String, usize)> {
        self.hierarchy()
            .levels()
            .iter()
            .map(|l| (l.name.clone(), self.targets.size(l.rank)))
            .collect()
    }

    /// The CEFR tuning for an A1..C1 ladder, the conservative variant otherwise.
    pub fn default_policy(&self) -> SelectionPolicy {
        let names = self.hierarchy().names();
        if SelectionPolicy::is_cefr_ladder(&names) {
            SelectionPolicy::cefr_defaults()
        } else {
            SelectionPolicy::conservative(&names)
        }
    }

    pub fn build_path(&self, policy: &SelectionPolicy) -> Result<PathResult> {
        PathOptimizer::new(self.hierarchy(), &self.profiles, &self.targets).run(policy)
    }

    pub fn build_default_path(&self) -> Result<PathResult> {
        self.build_path(&self.default_policy())
    }

    pub fn build_strategy(&self, strategy: Strategy) -> Result<PathResult> {
        info!("Running {} strategy.", strategy);
        self.build_path(&strategy.policy(self.hierarchy()))
    }

    /// Every named strategy, run independently.
    pub fn alternative_paths(&self) -> Result<Vec<(String, PathResult)>> {
        Strategy::ALL
            .iter()
            .map(|s| self.build_strategy(*s).map(|path| (s.name().to_string(), path)))
            .collect()
    }

    pub fn evaluate(&self, item_id: &str, level: &str) -> Result<ItemEvaluation> {
        let profile = self.profile_of(item_id)?;
        let rank = self.hierarchy().index(level)?;

        let mut best = (0, profile.suitability_at(0));
        for (i, s) in profile.suitability.iter().enumerate() {
            if s.score > best.1 {
                best = (i, s.score);
            }
        }
        let best_fit_level = self
            .hierarchy()
            .level(best.0)
            .map(|l| l.name.clone())
            .unwrap_or_default();

        Ok(ItemEvaluation {
            item_id: profile.item_id.clone(),
            level: level.to_string(),
            suitability: profile.suitability_at(rank),
            level_word_count: profile.count_at(rank),
            best_fit_level,
            best_fit_suitability: best.1,
            difficulty_score: profile.difficulty_score,
            difficulty_category: profile.difficulty_category(),
            learning_value: profile.learning_value,
            overflow_ratio: profile.overflow_ratio(),
            high_overflow: profile.overflow_ratio() > HIGH_OVERFLOW_RATIO,
            high_learning_value: profile.learning_value > HIGH_LEARNING_VALUE,
            recommended_levels: profile.recommended_levels().into_iter().map(String::from).collect(),
        })
    }
}
