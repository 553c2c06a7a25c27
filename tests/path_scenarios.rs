use std::fs;

use reading_path::config::load_config_from_file;
use reading_path::path_io;
use reading_path::{
    HierarchyConfig, ItemVocabulary, LevelHierarchy, PathBuilder, SelectionPolicy, StopReason, Strategy,
    VocabularyMapping,
};
use tempfile::tempdir;

fn range(prefix: &str, from: usize, to: usize) -> Vec<String> {
    (from..to).map(|i| format!("{}_{}", prefix, i)).collect()
}

fn item(id: &str, parts: &[Vec<String>]) -> ItemVocabulary {
    ItemVocabulary::new(id, parts.iter().flatten())
}

/// Three levels of twenty words each and five books stepping through them.
fn three_level_builder() -> PathBuilder {
    let hierarchy = LevelHierarchy::new(HierarchyConfig::new(["L1", "L2", "L3"])).unwrap();
    let mut mapping = VocabularyMapping::new();
    for (prefix, level) in [("l1", "L1"), ("l2", "L2"), ("l3", "L3")] {
        for word in range(prefix, 0, 20) {
            mapping.insert(&word, level);
        }
    }
    let items = vec![
        item("book_e", &[range("l3", 5, 20), range("zz", 0, 3)]),
        item("book_d", &[range("l2", 10, 20), range("l3", 0, 10)]),
        item("book_c", &[range("l2", 0, 15), range("l1", 0, 5)]),
        item("book_b", &[range("l1", 10, 20), range("l2", 0, 5)]),
        item("book_a", &[range("l1", 0, 15)]),
    ];
    PathBuilder::new(hierarchy, &mapping, items).unwrap()
}

fn open_policy(cap: usize) -> SelectionPolicy {
    let mut policy = SelectionPolicy::default()
        .with_max_overflow(0.2)
        .with_min_relevance(0.0)
        .with_min_target_words(5);
    for level in ["L1", "L2", "L3"] {
        policy = policy.with_max_books(level, cap).with_target_coverage(level, 1.0);
    }
    policy
}

#[test]
fn three_level_path() {
    let builder = three_level_builder();
    let result = builder.build_path(&open_policy(2)).unwrap();

    assert_eq!(result.selected_items, vec!["book_a", "book_b", "book_c", "book_d", "book_e"]);

    let l1 = result.level("L1").unwrap();
    assert_eq!(l1.items, vec!["book_a", "book_b"]);
    assert_eq!(l1.coverage, 1.0);
    assert_eq!(l1.stop_reason, StopReason::BookCap);

    // book_b already brought l2_0..l2_4.
    let l2 = result.level("L2").unwrap();
    assert_eq!(l2.items, vec!["book_c", "book_d"]);
    assert_eq!(l2.coverage, 0.75);
    assert_eq!(l2.target_words, 20);

    let l3 = result.level("L3").unwrap();
    assert_eq!(l3.items, vec!["book_e"]);
    assert_eq!(l3.coverage, 0.5);
    assert_eq!(l3.stop_reason, StopReason::VocabularyExhausted);

    let after_l1 = result.coverage_after("L1").unwrap();
    assert_eq!(after_l1.ratio_for("L1"), Some(1.0));
    assert_eq!(after_l1.ratio_for("L2"), Some(0.25));
    assert_eq!(after_l1.ratio_for("L3"), Some(0.0));
    let after_l2 = result.coverage_after("L2").unwrap();
    assert_eq!(after_l2.ratio_for("L2"), Some(1.0));
    assert_eq!(after_l2.ratio_for("L3"), Some(0.5));
    assert_eq!(result.coverage_after("L3").unwrap().ratio_for("L3"), Some(1.0));

    let summary = &result.summary;
    assert_eq!(summary.total_items, 5);
    assert_eq!(summary.final_coverage.iter().map(|s| s.ratio).collect::<Vec<_>>(), vec![1.0, 1.0, 1.0]);
    assert_eq!(summary.difficulty_progression[0].average_difficulty, 1.17);
    assert_eq!(summary.difficulty_progression[2].average_difficulty, 3.17);
}

#[test]
fn single_candidate_stops_at_cap_with_half_coverage() {
    let hierarchy = LevelHierarchy::new(HierarchyConfig::new(["A"])).unwrap();
    let mapping: VocabularyMapping = [("a", "A"), ("b", "A"), ("c", "A"), ("d", "A")].into_iter().collect();
    let builder = PathBuilder::new(hierarchy, &mapping, vec![ItemVocabulary::new("half", ["a", "b"])]).unwrap();

    let policy = SelectionPolicy::default()
        .with_max_books("A", 1)
        .with_target_coverage("A", 1.0)
        .with_min_relevance(0.0)
        .with_min_target_words(1);
    let result = builder.build_path(&policy).unwrap();

    let a = &result.levels[0];
    assert_eq!(a.items, vec!["half"]);
    assert_eq!(a.coverage, 0.5);
}

#[test]
fn tied_items_resolve_the_same_way_every_time() {
    let hierarchy = LevelHierarchy::new(HierarchyConfig::new(["A"])).unwrap();
    let mapping: VocabularyMapping = [("a", "A"), ("b", "A")].into_iter().collect();
    let policy = SelectionPolicy::default()
        .with_max_books("A", 1)
        .with_min_relevance(0.0)
        .with_min_target_words(1);

    for items in [
        vec![ItemVocabulary::new("z_copy", ["a", "b"]), ItemVocabulary::new("a_copy", ["a", "b"])],
        vec![ItemVocabulary::new("a_copy", ["a", "b"]), ItemVocabulary::new("z_copy", ["a", "b"])],
    ] {
        let builder = PathBuilder::new(hierarchy.clone(), &mapping, items).unwrap();
        assert_eq!(builder.build_path(&policy).unwrap().selected_items, vec!["a_copy"]);
    }
}

#[test]
fn strategies_respect_their_own_caps() {
    let builder = three_level_builder();
    let paths = builder.alternative_paths().unwrap();
    assert_eq!(paths.len(), 3);

    for (name, result) in &paths {
        let policy = name.parse::<Strategy>().unwrap().policy(builder.hierarchy());
        for level in &result.levels {
            assert!(level.items.len() <= policy.max_books_for(&level.level));
        }
        assert_eq!(result.levels.len(), 3);
    }
}

#[test]
fn evaluate_reports_best_fit() {
    let builder = three_level_builder();
    let eval = builder.evaluate("book_e", "L3").unwrap();
    assert_eq!(eval.level_word_count, 15);
    assert_eq!(eval.best_fit_level, "L3");
    assert!(!eval.high_overflow);
    assert!((eval.overflow_ratio - 3.0 / 18.0).abs() < 1e-12);
}

#[test]
fn run_from_config_files() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("items.json"),
        r#"{"short": ["cat", "dog"], "long": ["cat", "dog", "sun", "moon", "rain"]}"#,
    )
    .unwrap();
    fs::write(dir.path().join("levels.txt"), "# level list\ncat A\ndog A\nsun B\nmoon B\nrain B\n").unwrap();
    let config_path = dir.path().join("run.toml");
    fs::write(
        &config_path,
        r#"
items = "items.json"
mapping = "levels.txt"

[hierarchy]
levels = ["A", "B"]

[policy]
min_target_words = 1
min_relevance = 0.0

[policy.max_books]
A = 1
B = 1
"#,
    )
    .unwrap();

    let config = load_config_from_file(&config_path).unwrap();
    let hierarchy = LevelHierarchy::new(config.hierarchy.clone()).unwrap();
    let mapping = path_io::load_mapping(&config.mapping).unwrap();
    let items = path_io::load_items(&config.items).unwrap();
    let builder = PathBuilder::new(hierarchy, &mapping, items).unwrap();
    let result = builder.build_path(config.policy.as_ref().unwrap()).unwrap();

    // "long" wins at A on the preview bonus; "short" has no B words to offer.
    assert_eq!(result.selected_items, vec!["long"]);
    assert_eq!(result.levels[1].stop_reason, StopReason::NoCandidates);
    assert_eq!(result.summary.final_coverage[1].ratio, 1.0);

    let saved = dir.path().join("path.json");
    path_io::save_path_result(&result, &saved).unwrap();
    assert_eq!(path_io::load_path_result(&saved).unwrap(), result);
}
