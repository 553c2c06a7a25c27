use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::hierarchy::LevelHierarchy;

/// Lemma strings are compared after trimming and lowercasing.
pub fn normalize_word(word: &str) -> Option<String> {
    let cleaned = word.trim().to_lowercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Word -> level name. A word absent from this mapping is overflow
/// vocabulary for every item containing it.
///
/// Level names are not checked against a hierarchy here; entries pointing at
/// an unconfigured level still count as known vocabulary.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VocabularyMapping {
    word_to_level: HashMap<String, String>,
}

impl VocabularyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `word` under `level`, replacing any earlier level for it.
    /// Empty words are dropped and `false` is returned.
    pub fn insert(&mut self, word: &str, level: &str) -> bool {
        match normalize_word(word) {
            Some(cleaned) => {
                self.word_to_level.insert(cleaned, level.trim().to_string());
                true
            }
            None => false,
        }
    }

    pub fn level_of(&self, word: &str) -> Option<&str> {
        let cleaned = normalize_word(word)?;
        self.word_to_level.get(&cleaned).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.level_of(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.word_to_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_to_level.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.word_to_level.iter().map(|(w, l)| (w.as_str(), l.as_str()))
    }

    /// Words grouped by rank for every level in `hierarchy`. Entries whose
    /// level is not configured are left out.
    pub fn group_by_level(&self, hierarchy: &LevelHierarchy) -> Vec<BTreeSet<String>> {
        let mut groups = vec![BTreeSet::new(); hierarchy.level_count()];
        for (word, level) in &self.word_to_level {
            if let Ok(rank) = hierarchy.index(level) {
                groups[rank].insert(word.clone());
            }
        }
        groups
    }
}

impl<W, L> FromIterator<(W, L)> for VocabularyMapping
where
    W: AsRef<str>,
    L: AsRef<str>,
{
    fn from_iter<T: IntoIterator<Item = (W, L)>>(iter: T) -> Self {
        let mut mapping = VocabularyMapping::new();
        for (word, level) in iter {
            mapping.insert(word.as_ref(), level.as_ref());
        }
        mapping
    }
}

/// One content item and the distinct words it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVocabulary {
    pub id: String,
    pub words: BTreeSet<String>,
}

impl ItemVocabulary {
    pub fn new<I, S>(id: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            id: id.trim().to_string(),
            words: words.into_iter().filter_map(|w| normalize_word(w.as_ref())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Builds the item list from an id -> words table, in ascending id order.
/// Items with a blank id are skipped.
pub fn items_from_map(table: BTreeMap<String, Vec<String>>) -> Vec<ItemVocabulary> {
    table
        .into_iter()
        .filter(|(id, _)| !id.trim().is_empty())
        .map(|(id, words)| ItemVocabulary::new(&id, words))
        .collect()
}

/// Curriculum words each level is meant to teach, indexed by rank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetVocabulary {
    per_level: Vec<BTreeSet<String>>,
}

impl TargetVocabulary {
    pub fn from_mapping(mapping: &VocabularyMapping, hierarchy: &LevelHierarchy) -> Self {
        Self { per_level: mapping.group_by_level(hierarchy) }
    }

    /// Explicit per-rank targets; missing trailing ranks are treated as empty.
    pub fn from_levels(per_level: Vec<BTreeSet<String>>) -> Self {
        Self { per_level }
    }

    pub fn for_rank(&self, rank: usize) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.per_level.get(rank).unwrap_or(&EMPTY)
    }

    pub fn size(&self, rank: usize) -> usize {
        self.for_rank(rank).len()
    }
}
