use html5gum::{DefaultEmitter, Token, Tokenizer};
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// Tag-frequency table for one document.
///
/// Keys are lowercase tag names seen as start or self-closing tags. A tag is
/// only present once it has been recorded, so every count is at least one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagCounts {
    counts: HashMap<String, usize>,
}

impl TagCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `name`.
    pub fn record(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        *self.counts.entry(name.to_ascii_lowercase()).or_insert(0) += 1;
    }

    pub fn get(&self, name: &str) -> usize {
        self.counts
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct tag names.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of tags recorded.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Entries ordered by descending count, ties broken by tag name.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Add every count from `other` into this table.
    pub fn merge(&mut self, other: &TagCounts) {
        for (name, count) in other.iter() {
            *self.counts.entry(name.to_string()).or_insert(0) += count;
        }
    }
}

impl<S: AsRef<str>> FromIterator<(S, usize)> for TagCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = TagCounts::new();
        for (name, count) in iter {
            if count == 0 || name.as_ref().is_empty() {
                continue;
            }
            *counts
                .counts
                .entry(name.as_ref().to_ascii_lowercase())
                .or_insert(0) += count;
        }
        counts
    }
}

/// Count start and self-closing tags in an HTML document.
///
/// Works at the tokenizer level, so elements a tree builder would insert on
/// its own (an implied `<head>`, say) are not counted. Tokenizer errors are
/// recoverable and never stop the count.
///
/// The bodies of raw-text and RCDATA elements (`script`, `style`, `textarea`,
/// `title`, ...) are text, so markup inside them is not counted.
pub fn count_tags(html: &str) -> TagCounts {
    let mut counts = TagCounts::new();
    let mut parse_errors = 0usize;

    let mut emitter = DefaultEmitter::default();
    emitter.naively_switch_states(true);

    for token in Tokenizer::new_with_emitter(html, emitter) {
        match token {
            Ok(Token::StartTag(tag)) => counts.record(&String::from_utf8_lossy(&tag.name)),
            Ok(Token::Error(_)) => parse_errors += 1,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    if parse_errors > 0 {
        trace!("Tokenizer reported {} recoverable parse errors", parse_errors);
    }

    counts
}

/// Lossy UTF-8 decode followed by [`count_tags`].
pub fn count_tags_in_bytes(body: &[u8]) -> TagCounts {
    count_tags(&String::from_utf8_lossy(body))
}
