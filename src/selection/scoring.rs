use std::collections::BTreeSet;

use crate::profile::ItemProfile;
use crate::selection::policy::ScoringWeights;

/// Greedy score of `profile` for the level at `rank` against the words still
/// missing from that level's target.
///
/// Returns `None` when the item adds no word from `remaining`; such an item is
/// not eligible this round, whatever its bonuses would be. `iteration` counts
/// from 1 within a level.
pub fn score(
    profile: &ItemProfile,
    rank: usize,
    remaining: &BTreeSet<String>,
    iteration: usize,
    weights: &ScoringWeights,
) -> Option<f64> {
    let new_words = new_word_count(profile, rank, remaining);
    if new_words == 0 {
        return None;
    }

    let mut score = weights.new_word * new_words as f64;

    let review: usize = profile.levels.iter().take(rank).map(|s| s.count).sum();
    score += weights.review * review as f64;

    // No next level at the hardest rank.
    if let Some(next) = profile.level_stats(rank + 1) {
        score += weights.preview * next.count.min(weights.preview_cap) as f64;
    }

    score -= weights.overflow_penalty * profile.overflow_count() as f64;

    if iteration > weights.efficiency_after_iteration && !remaining.is_empty() {
        score += weights.efficiency * (new_words as f64 / remaining.len() as f64);
    }

    Some(score)
}

/// Target words at `rank` this item would newly cover.
pub fn new_word_count(profile: &ItemProfile, rank: usize, remaining: &BTreeSet<String>) -> usize {
    profile
        .words_at(rank)
        .map_or(0, |words| words.intersection(remaining).count())
}
