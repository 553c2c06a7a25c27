use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::vocabulary::{ItemVocabulary, VocabularyMapping};

// "word level", "word,level" or "word<TAB>level"
fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^\s,]+)(?:\s*,\s*|\s+)([^\s,]+)$").expect("word-list entry pattern is valid"))
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\s,]+").expect("token pattern is valid"))
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parses a plain-text word list with one `word level` pair per line.
///
/// Blank lines and `#` comments are ignored. Lines that do not hold exactly
/// one pair are logged and skipped; a word listed twice keeps its last level.
pub fn parse_mapping_text(source_name: &str, content: &str) -> VocabularyMapping {
    let mut mapping = VocabularyMapping::new();
    let mut skipped = 0;

    for (line_no, line) in content.lines().enumerate() {
        let line_trimmed = strip_comment(line).trim();
        if line_trimmed.is_empty() {
            continue;
        }
        match entry_re().captures(line_trimmed) {
            Some(caps) => {
                mapping.insert(&caps[1], &caps[2]);
            }
            None => {
                warn!("{}:{}: expected 'word level', skipping: {}", source_name, line_no + 1, line_trimmed);
                skipped += 1;
            }
        }
    }

    debug!("Parsed {} entries from {} ({} lines skipped).", mapping.len(), source_name, skipped);
    mapping
}

/// Reads an item's word list: tokens separated by whitespace or commas.
/// Tokens are normalised but not lemmatised.
pub fn parse_item_text(item_id: &str, content: &str) -> ItemVocabulary {
    let tokens = content
        .lines()
        .flat_map(|line| token_re().find_iter(strip_comment(line)))
        .map(|m| m.as_str());
    ItemVocabulary::new(item_id, tokens)
}
