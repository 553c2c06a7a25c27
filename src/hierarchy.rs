use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PathError, Result};

pub const DEFAULT_OVERFLOW_LEVEL: &str = "BEYOND";

fn default_overflow_level() -> String {
    DEFAULT_OVERFLOW_LEVEL.to_string()
}

/// Selects the progression rule in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressionKind {
    #[default]
    Linear,
    Exponential,
    Custom,
}

/// Raw, unvalidated hierarchy settings as they appear in a run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Ordered from easiest to hardest.
    pub levels: Vec<String>,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub progression: ProgressionKind,
    #[serde(default = "default_overflow_level")]
    pub overflow_level: String,
    #[serde(default)]
    pub custom_multipliers: Option<HashMap<String, f64>>,
}

impl HierarchyConfig {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
            weights: HashMap::new(),
            progression: ProgressionKind::Linear,
            overflow_level: default_overflow_level(),
            custom_multipliers: None,
        }
    }

    pub fn with_weight(mut self, level: &str, weight: f64) -> Self {
        self.weights.insert(level.to_string(), weight);
        self
    }

    pub fn with_progression(mut self, progression: ProgressionKind) -> Self {
        self.progression = progression;
        self
    }

    pub fn with_overflow_level(mut self, name: &str) -> Self {
        self.overflow_level = name.to_string();
        self
    }

    pub fn with_custom_multiplier(mut self, level: &str, multiplier: f64) -> Self {
        self.progression = ProgressionKind::Custom;
        self.custom_multipliers
            .get_or_insert_with(HashMap::new)
            .insert(level.to_string(), multiplier);
        self
    }
}

// --- Progression rules ---

fn linear_multiplier(rank: usize) -> f64 {
    (rank + 1) as f64
}

fn exponential_multiplier(rank: usize) -> f64 {
    2f64.powi(rank as i32)
}

/// How the difficulty multiplier grows with level rank.
#[derive(Debug, Clone, PartialEq)]
pub enum Progression {
    /// rank + 1
    Linear,
    /// 2^rank
    Exponential,
    /// Explicit multiplier per level name.
    Custom(HashMap<String, f64>),
}

impl Progression {
    pub fn multiplier(&self, rank: usize, level: &str) -> Result<f64> {
        match self {
            Progression::Linear => Ok(linear_multiplier(rank)),
            Progression::Exponential => Ok(exponential_multiplier(rank)),
            Progression::Custom(rules) => rules
                .get(level)
                .copied()
                .ok_or_else(|| PathError::MissingCustomRule(level.to_string())),
        }
    }

    pub fn kind(&self) -> ProgressionKind {
        match self {
            Progression::Linear => ProgressionKind::Linear,
            Progression::Exponential => ProgressionKind::Exponential,
            Progression::Custom(_) => ProgressionKind::Custom,
        }
    }
}

/// One rung of the difficulty ladder. Immutable once the hierarchy is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level {
    pub name: String,
    /// 0 is the easiest level.
    pub rank: usize,
    pub weight: f64,
    pub multiplier: f64,
}

/// Ordered, validated set of difficulty levels.
///
/// Every downstream computation is parametric over this table; level names
/// are only looked up here, never branched on elsewhere.
#[derive(Debug, Clone)]
pub struct LevelHierarchy {
    levels: Vec<Level>,
    index: HashMap<String, usize>,
    progression: Progression,
    overflow_level: String,
}

impl LevelHierarchy {
    /// Validates `config` and derives each level's weight and multiplier.
    pub fn new(config: HierarchyConfig) -> Result<Self> {
        let HierarchyConfig {
            levels: names,
            weights,
            progression,
            overflow_level,
            custom_multipliers,
        } = config;

        if names.is_empty() {
            return Err(PathError::EmptyHierarchy);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(PathError::DuplicateLevel(name.clone()));
            }
        }

        for (level, &value) in &weights {
            // Also rejects NaN.
            if !(value > 0.0) {
                return Err(PathError::NonPositiveWeight { level: level.clone(), value });
            }
            if !seen.contains(level.as_str()) {
                warn!("Weight given for level '{}' which is not in the hierarchy; ignoring it.", level);
            }
        }

        if seen.contains(overflow_level.as_str()) {
            return Err(PathError::OverflowLevelCollision(overflow_level));
        }

        let progression = match progression {
            ProgressionKind::Linear => Progression::Linear,
            ProgressionKind::Exponential => Progression::Exponential,
            ProgressionKind::Custom => {
                let rules = custom_multipliers.unwrap_or_default();
                if let Some(missing) = names.iter().find(|name| !rules.contains_key(*name)) {
                    return Err(PathError::MissingCustomRule(missing.clone()));
                }
                Progression::Custom(rules)
            }
        };

        let mut levels = Vec::with_capacity(names.len());
        for (rank, name) in names.into_iter().enumerate() {
            let multiplier = progression.multiplier(rank, &name)?;
            let weight = weights.get(&name).copied().unwrap_or(1.0);
            levels.push(Level { name, rank, weight, multiplier });
        }

        Ok(Self::assemble(levels, progression, overflow_level))
    }

    fn assemble(levels: Vec<Level>, progression: Progression, overflow_level: String) -> Self {
        let index = levels.iter().map(|l| (l.name.clone(), l.rank)).collect();
        Self { levels, index, progression, overflow_level }
    }

    // Presets are known-valid, so they bypass validation.
    fn preset(names: &[&str], weights: &[f64], progression: Progression, overflow_level: &str) -> Self {
        let levels = names
            .iter()
            .zip(weights)
            .enumerate()
            .map(|(rank, (name, &weight))| Level {
                name: name.to_string(),
                rank,
                weight,
                multiplier: if matches!(progression, Progression::Exponential) {
                    exponential_multiplier(rank)
                } else {
                    linear_multiplier(rank)
                },
            })
            .collect();
        Self::assemble(levels, progression, overflow_level.to_string())
    }

    /// CEFR A1..C1, weights favouring the easier levels, linear progression.
    pub fn cefr() -> Self {
        Self::preset(
            &["A1", "A2", "B1", "B2", "C1"],
            &[1.5, 1.3, 1.1, 1.0, 0.9],
            Progression::Linear,
            DEFAULT_OVERFLOW_LEVEL,
        )
    }

    /// School grades Grade1..GradeN with exponential progression.
    ///
    /// Weights fall by 0.2 per grade from 2.0, so `max_grade` above 10
    /// produces a non-positive weight and is rejected.
    pub fn grades(max_grade: usize) -> Result<Self> {
        let mut config = HierarchyConfig::new((1..=max_grade).map(|i| format!("Grade{}", i)))
            .with_progression(ProgressionKind::Exponential)
            .with_overflow_level("ADVANCED");
        for i in 0..max_grade {
            let name = format!("Grade{}", i + 1);
            config = config.with_weight(&name, 2.0 - i as f64 * 0.2);
        }
        Self::new(config)
    }

    /// Corpus frequency bands, most frequent first.
    pub fn frequency_bands() -> Self {
        Self::preset(
            &["HighFreq", "MidFreq", "LowFreq", "Rare"],
            &[1.8, 1.3, 1.0, 0.7],
            Progression::Linear,
            "UNKNOWN",
        )
    }

    // --- Lookups ---

    pub fn index(&self, level: &str) -> Result<usize> {
        self.index
            .get(level)
            .copied()
            .ok_or_else(|| PathError::UnknownLevel(level.to_string()))
    }

    pub fn multiplier(&self, level: &str) -> Result<f64> {
        let rank = self.index(level)?;
        self.progression.multiplier(rank, level)
    }

    /// Learning weight; 1.0 for anything without an explicit weight.
    pub fn weight(&self, level: &str) -> f64 {
        self.index
            .get(level)
            .map(|&rank| self.levels[rank].weight)
            .unwrap_or(1.0)
    }

    /// Inclusive prefix of the hierarchy ending at `level`.
    pub fn levels_up_to(&self, level: &str) -> Result<&[Level]> {
        let rank = self.index(level)?;
        Ok(&self.levels[..=rank])
    }

    pub fn is_valid_progression(&self, from: &str, to: &str) -> bool {
        match (self.index(from), self.index(to)) {
            (Ok(from), Ok(to)) => from <= to,
            _ => false,
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, rank: usize) -> Option<&Level> {
        self.levels.get(rank)
    }

    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn contains(&self, level: &str) -> bool {
        self.index.contains_key(level)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// (easiest, hardest)
    pub fn difficulty_range(&self) -> (&str, &str) {
        // Construction guarantees at least one level.
        let first = self.levels[0].name.as_str();
        let last = self.levels[self.levels.len() - 1].name.as_str();
        (first, last)
    }

    pub fn max_multiplier(&self) -> f64 {
        self.levels
            .iter()
            .map(|l| l.multiplier)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn overflow_level(&self) -> &str {
        &self.overflow_level
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }
}
