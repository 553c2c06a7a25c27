use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::hierarchy::{Level, LevelHierarchy};
use crate::profile::ItemProfile;
use crate::selection::policy::SelectionPolicy;
use crate::selection::scoring;
use crate::types::path_data::{
    CoverageSnapshot, CoverageStat, LevelCount, LevelDifficulty, LevelSelectionResult, PathResult,
    PathSummary, StopReason,
};
use crate::vocabulary::TargetVocabulary;

/// What one run carries from level to level. Created fresh for every run.
#[derive(Debug, Clone, Default)]
pub(crate) struct SelectionState {
    covered: HashSet<String>,
    selected: HashSet<String>,
}

impl SelectionState {
    fn is_selected(&self, item_id: &str) -> bool {
        self.selected.contains(item_id)
    }

    fn is_covered(&self, word: &str) -> bool {
        self.covered.contains(word)
    }

    /// Marks the item as used and folds in its words from every level.
    fn absorb(&mut self, profile: &ItemProfile) {
        self.selected.insert(profile.item_id.clone());
        for stats in &profile.levels {
            self.covered.extend(stats.words.iter().cloned());
        }
    }
}

/// Output of a single level step, before it is folded into the path.
struct LevelOutcome<'p> {
    result: LevelSelectionResult,
    chosen: Vec<&'p ItemProfile>,
}

/// Greedy level-by-level item selection over precomputed profiles.
///
/// Profiles are considered in the order given; that order breaks ties both in
/// the learning-value sort and between equal scores.
pub struct PathOptimizer<'a> {
    hierarchy: &'a LevelHierarchy,
    profiles: &'a [ItemProfile],
    targets: &'a TargetVocabulary,
}

impl<'a> PathOptimizer<'a> {
    pub fn new(hierarchy: &'a LevelHierarchy, profiles: &'a [ItemProfile], targets: &'a TargetVocabulary) -> Self {
        Self { hierarchy, profiles, targets }
    }

    pub fn run(&self, policy: &SelectionPolicy) -> Result<PathResult> {
        policy.validate(self.hierarchy)?;

        let mut state = SelectionState::default();
        let mut levels = Vec::with_capacity(self.hierarchy.level_count());
        let mut selected_items = Vec::new();
        let mut cumulative_coverage = Vec::with_capacity(self.hierarchy.level_count());
        let mut difficulty_progression = Vec::new();

        for level in self.hierarchy.levels() {
            info!("=== Selecting items for level {} ===", level.name);
            let (outcome, next_state) = self.select_level(level, policy, state);
            state = next_state;

            if !outcome.chosen.is_empty() {
                let total: f64 = outcome.chosen.iter().map(|p| p.difficulty_score).sum();
                let average = total / outcome.chosen.len() as f64;
                difficulty_progression.push(LevelDifficulty {
                    level: level.name.clone(),
                    average_difficulty: (average * 100.0).round() / 100.0,
                });
            }

            let snapshot = self.snapshot(&level.name, &state);
            for stat in &snapshot.levels {
                info!("  cumulative {}: {:.1}%", stat.level, stat.ratio * 100.0);
            }

            selected_items.extend(outcome.result.items.iter().cloned());
            cumulative_coverage.push(snapshot);
            levels.push(outcome.result);
        }

        let summary = PathSummary {
            total_items: selected_items.len(),
            items_per_level: levels
                .iter()
                .map(|l| LevelCount { level: l.level.clone(), count: l.items.len() })
                .collect(),
            final_coverage: cumulative_coverage.last().map(|s| s.levels.clone()).unwrap_or_default(),
            difficulty_progression,
            recommended_order: selected_items.clone(),
        };
        info!(
            "Reading path complete: {} items over {} levels.",
            summary.total_items,
            levels.len()
        );

        Ok(PathResult { levels, selected_items, cumulative_coverage, summary })
    }

    /// One step of the fold over the hierarchy: takes the accumulated state,
    /// returns the level's selection and the updated state.
    fn select_level(
        &self,
        level: &Level,
        policy: &SelectionPolicy,
        mut state: SelectionState,
    ) -> (LevelOutcome<'a>, SelectionState) {
        let candidates = self.filter_candidates(level, policy, &state);
        let target = self.targets.for_rank(level.rank);
        let mut remaining: BTreeSet<String> =
            target.iter().filter(|w| !state.is_covered(w)).cloned().collect();
        info!(
            "  {} candidates; target {}, already covered {}, remaining {}",
            candidates.len(),
            target.len(),
            target.len() - remaining.len(),
            remaining.len()
        );

        let candidate_count = candidates.len();
        let mut chosen = Vec::new();
        let mut newly_covered = BTreeSet::new();

        let stop_reason = if candidates.is_empty() {
            warn!("No suitable candidates for level {}.", level.name);
            StopReason::NoCandidates
        } else if remaining.is_empty() {
            warn!("Target vocabulary of level {} is already covered.", level.name);
            StopReason::TargetAlreadyCovered
        } else {
            self.greedy(level, policy, candidates, target.len(), &mut remaining, &mut chosen, &mut newly_covered)
        };
        debug!("Level {} stopped: {:?}", level.name, stop_reason);

        let coverage = if target.is_empty() {
            0.0
        } else {
            newly_covered.len() as f64 / target.len() as f64
        };
        for profile in &chosen {
            state.absorb(profile);
        }

        let result = LevelSelectionResult {
            level: level.name.clone(),
            items: chosen.iter().map(|p| p.item_id.clone()).collect(),
            coverage,
            covered_words: newly_covered.len(),
            newly_covered,
            target_words: target.len(),
            candidate_count,
            stop_reason,
        };
        (LevelOutcome { result, chosen }, state)
    }

    fn filter_candidates(&self, level: &Level, policy: &SelectionPolicy, state: &SelectionState) -> Vec<&'a ItemProfile> {
        let rank = level.rank;
        let mut candidates: Vec<&ItemProfile> = self
            .profiles
            .iter()
            .filter(|p| !state.is_selected(&p.item_id))
            .filter(|p| p.overflow_ratio() <= policy.max_overflow)
            .filter(|p| p.suitability_at(rank) >= policy.min_relevance)
            .filter(|p| p.count_at(rank) >= policy.min_target_words)
            .collect();
        // Stable, so equal learning values keep input order.
        candidates.sort_by(|a, b| b.learning_value.total_cmp(&a.learning_value));
        candidates
    }

    #[allow(clippy::too_many_arguments)]
    fn greedy(
        &self,
        level: &Level,
        policy: &SelectionPolicy,
        mut pool: Vec<&'a ItemProfile>,
        target_size: usize,
        remaining: &mut BTreeSet<String>,
        chosen: &mut Vec<&'a ItemProfile>,
        newly_covered: &mut BTreeSet<String>,
    ) -> StopReason {
        let cap = policy.max_books_for(&level.name);
        let goal = policy.target_coverage_for(&level.name);
        let mut iteration = 0;

        loop {
            if chosen.len() >= cap {
                return StopReason::BookCap;
            }
            if newly_covered.len() as f64 / target_size as f64 >= goal {
                return StopReason::TargetCoverageReached;
            }
            if remaining.is_empty() {
                return StopReason::VocabularyExhausted;
            }
            if pool.is_empty() {
                return StopReason::CandidatesExhausted;
            }

            iteration += 1;
            let Some((index, best_score)) = best_candidate(&pool, level.rank, remaining, iteration, policy) else {
                return StopReason::NoContributingCandidate;
            };

            let picked = pool.remove(index);
            let gained: Vec<String> = picked
                .words_at(level.rank)
                .map(|words| words.intersection(remaining).cloned().collect())
                .unwrap_or_default();
            for word in &gained {
                remaining.remove(word);
            }
            newly_covered.extend(gained.iter().cloned());

            info!(
                "  selected {} (score {:.1}): +{} {} words, coverage {:.1}%",
                picked.item_id,
                best_score,
                gained.len(),
                level.name,
                newly_covered.len() as f64 / target_size as f64 * 100.0
            );
            chosen.push(picked);
        }
    }

    fn snapshot(&self, after_level: &str, state: &SelectionState) -> CoverageSnapshot {
        let levels = self
            .hierarchy
            .levels()
            .iter()
            .map(|level| {
                let target = self.targets.for_rank(level.rank);
                let covered = target.iter().filter(|w| state.is_covered(w)).count();
                let total = target.len();
                CoverageStat {
                    level: level.name.clone(),
                    covered,
                    total,
                    ratio: if total > 0 { covered as f64 / total as f64 } else { 0.0 },
                }
            })
            .collect();
        CoverageSnapshot { after_level: after_level.to_string(), levels }
    }
}

/// Highest-scoring contributing candidate; the first one wins ties.
fn best_candidate(
    pool: &[&ItemProfile],
    rank: usize,
    remaining: &BTreeSet<String>,
    iteration: usize,
    policy: &SelectionPolicy,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, profile) in pool.iter().enumerate() {
        let Some(score) = scoring::score(profile, rank, remaining, iteration, &policy.scoring) else {
            continue;
        };
        debug!("    iteration {}: {} scores {:.2}", iteration, profile.item_id, score);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyConfig;
    use crate::profile::VocabularyProfiler;
    use crate::vocabulary::VocabularyMapping;

    struct Fixture {
        hierarchy: LevelHierarchy,
        profiles: Vec<ItemProfile>,
        targets: TargetVocabulary,
    }

    impl Fixture {
        fn new(mapping: &[(&str, &str)], items: &[(&str, &[&str])]) -> Self {
            let hierarchy = LevelHierarchy::new(HierarchyConfig::new(["A", "B"])).unwrap();
            let mapping: VocabularyMapping = mapping.iter().copied().collect();
            let mut profiler = VocabularyProfiler::new(hierarchy.clone());
            profiler.set_mapping(&mapping);
            let profiles = items
                .iter()
                .map(|(id, words)| {
                    let words: BTreeSet<String> = words.iter().map(|w| w.to_string()).collect();
                    profiler.profile(id, &words).unwrap()
                })
                .collect();
            let targets = TargetVocabulary::from_mapping(&mapping, &hierarchy);
            Self { hierarchy, profiles, targets }
        }

        fn run(&self, policy: &SelectionPolicy) -> PathResult {
            PathOptimizer::new(&self.hierarchy, &self.profiles, &self.targets).run(policy).unwrap()
        }
    }

    fn open_policy() -> SelectionPolicy {
        SelectionPolicy::default()
            .with_max_overflow(1.0)
            .with_min_relevance(0.0)
            .with_min_target_words(1)
    }

    const FOUR_A: [(&str, &str); 5] = [("a1", "A"), ("a2", "A"), ("a3", "A"), ("a4", "A"), ("b1", "B")];

    #[test]
    fn test_cap_stops_before_target_coverage() {
        let items: [(&str, &[&str]); 1] = [("half", &["a1", "a2"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let policy = open_policy().with_max_books("A", 1).with_target_coverage("A", 1.0);
        let result = fx.run(&policy);

        let a = result.level("A").unwrap();
        assert_eq!(a.items, vec!["half"]);
        assert_eq!(a.coverage, 0.5);
        assert_eq!(a.stop_reason, StopReason::BookCap);
        assert_eq!(a.target_words, 4);
        assert_eq!(a.covered_words, 2);
    }

    #[test]
    fn test_candidate_exhaustion_stops_before_target_coverage() {
        let items: [(&str, &[&str]); 1] = [("half", &["a1", "a2"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let policy = open_policy().with_max_books("A", 3).with_target_coverage("A", 1.0);
        let a = fx.run(&policy).levels[0].clone();
        assert_eq!(a.items, vec!["half"]);
        assert_eq!(a.coverage, 0.5);
        assert_eq!(a.stop_reason, StopReason::CandidatesExhausted);
    }

    #[test]
    fn test_no_contributing_candidate() {
        let items: [(&str, &[&str]); 2] = [("x", &["a1", "a2"]), ("y", &["a1"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let policy = open_policy().with_max_books("A", 5).with_target_coverage("A", 1.0);
        let a = fx.run(&policy).levels[0].clone();
        assert_eq!(a.items, vec!["x"]);
        assert_eq!(a.stop_reason, StopReason::NoContributingCandidate);
    }

    #[test]
    fn test_target_coverage_reached() {
        let items: [(&str, &[&str]); 2] = [("x", &["a1", "a2", "a3"]), ("y", &["a4"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let policy = open_policy().with_max_books("A", 5).with_target_coverage("A", 0.5);
        let a = fx.run(&policy).levels[0].clone();
        assert_eq!(a.items, vec!["x"]);
        assert_eq!(a.coverage, 0.75);
        assert_eq!(a.stop_reason, StopReason::TargetCoverageReached);
    }

    #[test]
    fn test_overflow_limit_is_inclusive() {
        // One unmapped word in four: overflow is exactly 0.25.
        let items: [(&str, &[&str]); 1] = [("x", &["a1", "a2", "a3", "zz"])];
        let fx = Fixture::new(&FOUR_A, &items);

        let at_limit = fx.run(&open_policy().with_max_overflow(0.25).with_max_books("A", 1));
        assert_eq!(at_limit.levels[0].items, vec!["x"]);

        let below = fx.run(&open_policy().with_max_overflow(0.24).with_max_books("A", 1));
        assert!(below.levels[0].items.is_empty());
        assert_eq!(below.levels[0].candidate_count, 0);
        assert_eq!(below.levels[0].stop_reason, StopReason::NoCandidates);
    }

    #[test]
    fn test_relevance_is_measured_at_the_level_being_filled() {
        // Suitability 0.25 at A and 0.5 at B.
        let items: [(&str, &[&str]); 1] = [("y", &["a1", "b1", "q1", "q2"])];
        let fx = Fixture::new(&FOUR_A, &items);

        let at_limit = fx.run(&open_policy().with_min_relevance(0.5));
        assert_eq!(at_limit.levels[0].stop_reason, StopReason::NoCandidates);
        assert_eq!(at_limit.levels[1].items, vec!["y"]);
        assert_eq!(at_limit.levels[1].coverage, 1.0);

        let above = fx.run(&open_policy().with_min_relevance(0.51));
        assert!(above.levels[1].items.is_empty());
        assert_eq!(above.levels[1].stop_reason, StopReason::NoCandidates);
        assert!(above.selected_items.is_empty());
    }

    #[test]
    fn test_tie_goes_to_first_item() {
        let items: [(&str, &[&str]); 2] = [("p", &["a1", "a2"]), ("q", &["a1", "a2"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let policy = open_policy().with_max_books("A", 1);
        for _ in 0..3 {
            assert_eq!(fx.run(&policy).levels[0].items, vec!["p"]);
        }
    }

    #[test]
    fn test_items_covered_at_earlier_level_carry_forward() {
        let mapping = [("a1", "A"), ("a2", "A"), ("b1", "B"), ("b2", "B")];
        let items: [(&str, &[&str]); 2] = [("first", &["a1", "a2", "b1"]), ("second", &["b2", "a1"])];
        let fx = Fixture::new(&mapping, &items);
        let policy = open_policy()
            .with_max_books("A", 1)
            .with_max_books("B", 3)
            .with_target_coverage("B", 0.9);
        let result = fx.run(&policy);

        assert_eq!(result.levels[0].items, vec!["first"]);
        let b = &result.levels[1];
        assert_eq!(b.items, vec!["second"]);
        assert_eq!(b.stop_reason, StopReason::VocabularyExhausted);
        // Only b2 was new at B.
        assert_eq!(b.coverage, 0.5);
        assert_eq!(result.coverage_after("A").unwrap().ratio_for("B"), Some(0.5));
        assert_eq!(result.coverage_after("B").unwrap().ratio_for("B"), Some(1.0));
        assert_eq!(result.selected_items, vec!["first", "second"]);
    }

    #[test]
    fn test_already_covered_level_yields_empty_selection() {
        let mapping = [("a1", "A"), ("a2", "A"), ("b1", "B")];
        let items: [(&str, &[&str]); 2] = [("first", &["a1", "a2", "b1"]), ("second", &["a1", "b1"])];
        let fx = Fixture::new(&mapping, &items);
        let policy = open_policy().with_max_books("A", 1);
        let result = fx.run(&policy);

        assert_eq!(result.levels[0].items, vec!["first"]);
        let b = &result.levels[1];
        assert!(b.items.is_empty());
        assert_eq!(b.stop_reason, StopReason::TargetAlreadyCovered);
        assert_eq!(b.coverage, 0.0);
    }

    #[test]
    fn test_level_without_candidates_does_not_end_the_run() {
        let items: [(&str, &[&str]); 1] = [("only_b", &["b1"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let result = fx.run(&open_policy());

        assert_eq!(result.levels[0].stop_reason, StopReason::NoCandidates);
        assert_eq!(result.levels[0].candidate_count, 0);
        assert_eq!(result.levels[1].items, vec!["only_b"]);
        assert_eq!(result.summary.total_items, 1);
        assert_eq!(result.summary.difficulty_progression.len(), 1);
        assert_eq!(result.summary.difficulty_progression[0].level, "B");
    }

    #[test]
    fn test_summary() {
        let items: [(&str, &[&str]); 2] = [("x", &["a1", "a2", "zz"]), ("y", &["a3"])];
        let fx = Fixture::new(&FOUR_A, &items);
        let result = fx.run(&open_policy().with_max_books("A", 2).with_target_coverage("A", 1.0));

        let summary = &result.summary;
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.recommended_order, vec!["x", "y"]);
        assert_eq!(summary.items_per_level[0], LevelCount { level: "A".into(), count: 2 });
        assert_eq!(summary.items_per_level[1].count, 0);
        // x: (2*1 + 1*3) / 3, y: 1.0
        assert_eq!(summary.difficulty_progression[0].average_difficulty, 1.33);
        assert_eq!(summary.final_coverage, result.cumulative_coverage[1].levels);
    }

    #[test]
    fn test_invalid_policy_is_rejected_before_running() {
        let fx = Fixture::new(&FOUR_A, &[]);
        let policy = open_policy().with_max_books("Z", 1);
        let err = PathOptimizer::new(&fx.hierarchy, &fx.profiles, &fx.targets).run(&policy);
        assert!(err.is_err());
    }
}
