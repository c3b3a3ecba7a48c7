//! Override table classification and compiled pattern caching.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;
use tracing::debug;

use crate::error::ResolveError;
use crate::types::{Messages, OverrideMessage};

/// Characters that mark an override key as a path pattern.
///
/// `.` is excluded: it is the path separator in literal keys.
pub const PATTERN_METACHARACTERS: &[char] = &[
    '^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\',
];

/// How an override key is matched against a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Exact lookup by path, key, kind, or type.
    Literal,
    /// Anchored regex tested against the dotted path.
    Pattern,
}

impl Matcher {
    /// Classify an override key.
    pub fn classify(key: &str) -> Self {
        if key.contains(PATTERN_METACHARACTERS) {
            Matcher::Pattern
        } else {
            Matcher::Literal
        }
    }
}

/// A single configured override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub key: String,
    pub matcher: Matcher,
    pub message: OverrideMessage,
}

/// Override messages bucketed by matcher, built once per options value.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: Vec<OverrideEntry>,
    literals: HashMap<String, usize>,
    /// Pattern entry indexes in insertion order.
    patterns: Vec<usize>,
}

impl OverrideTable {
    pub fn build(messages: &Messages) -> Self {
        let mut table = OverrideTable::default();

        for (key, message) in messages.iter() {
            let matcher = Matcher::classify(key);
            let index = table.entries.len();
            match matcher {
                Matcher::Literal => {
                    table.literals.insert(key.to_string(), index);
                }
                Matcher::Pattern => table.patterns.push(index),
            }
            table.entries.push(OverrideEntry {
                key: key.to_string(),
                matcher,
                message: message.clone(),
            });
        }

        table
    }

    /// Exact lookup among literal entries.
    pub fn literal(&self, key: &str) -> Option<&OverrideEntry> {
        self.literals.get(key).map(|&index| &self.entries[index])
    }

    /// Pattern entries in insertion order.
    pub fn patterns(&self) -> impl Iterator<Item = &OverrideEntry> {
        self.patterns.iter().map(|&index| &self.entries[index])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Anchor a pattern at both ends, leaving existing anchors alone.
pub fn anchor(pattern: &str) -> Cow<'_, str> {
    let start = !pattern.starts_with('^');
    let end = !is_end_anchored(pattern);

    match (start, end) {
        (false, false) => Cow::Borrowed(pattern),
        (true, false) => Cow::Owned(format!("^{}", pattern)),
        (false, true) => Cow::Owned(format!("{}$", pattern)),
        (true, true) => Cow::Owned(format!("^{}$", pattern)),
    }
}

/// A trailing `$` only anchors when it isn't escaped.
fn is_end_anchored(pattern: &str) -> bool {
    let Some(body) = pattern.strip_suffix('$') else {
        return false;
    };
    let escapes = body.chars().rev().take_while(|&c| c == '\\').count();
    escapes % 2 == 0
}

/// Read-through cache of compiled override patterns keyed by source key.
///
/// Reads share a lock; a miss compiles outside the lock and inserts under
/// the write lock. Lives as long as the options it was built for.
#[derive(Debug, Default)]
pub struct PatternCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, Regex>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, Regex>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the compiled pattern for `key`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidPattern` if the anchored key is not a
    /// valid regex. Failures are not cached.
    pub fn get_or_compile(&self, key: &str) -> Result<Regex, ResolveError> {
        // Fast path
        if let Some(regex) = self.read_cache().get(key) {
            return Ok(regex.clone());
        }

        let anchored = anchor(key);
        let regex = Regex::new(&anchored).map_err(|source| ResolveError::InvalidPattern {
            key: key.to_string(),
            source,
        })?;
        debug!(key, pattern = %anchored, "compiled override pattern");

        // Another reader may have compiled the same key meanwhile
        let mut cache = self.write_cache();
        Ok(cache.entry(key.to_string()).or_insert(regex).clone())
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.read_cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_cache().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn classify_keys() {
        assert_eq!(Matcher::classify("email"), Matcher::Literal);
        assert_eq!(Matcher::classify("data.email"), Matcher::Literal);
        assert_eq!(Matcher::classify("string.email"), Matcher::Literal);
        assert_eq!(Matcher::classify("items\\.\\d+\\.name"), Matcher::Pattern);
        assert_eq!(Matcher::classify("data.*"), Matcher::Pattern);
        assert_eq!(Matcher::classify("^data"), Matcher::Pattern);
    }

    #[test]
    fn table_buckets_keep_insertion_order() {
        let messages: Messages = [
            ("data.*", "first pattern"),
            ("email", "literal"),
            ("(a|b)", "second pattern"),
        ]
        .into_iter()
        .collect();
        let table = OverrideTable::build(&messages);

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.literal("email").map(|e| e.matcher),
            Some(Matcher::Literal)
        );
        assert!(table.literal("data.*").is_none());
        let patterns: Vec<&str> = table.patterns().map(|e| e.key.as_str()).collect();
        assert_eq!(patterns, ["data.*", "(a|b)"]);
    }

    #[test]
    fn anchor_adds_missing_anchors() {
        assert_eq!(anchor("data.*"), "^data.*$");
        assert_eq!(anchor("^data.*"), "^data.*$");
        assert_eq!(anchor("data.*$"), "^data.*$");
    }

    #[test]
    fn anchor_is_idempotent() {
        let once = anchor("items\\.\\d+").into_owned();
        let twice = anchor(&once).into_owned();
        assert_eq!(once, twice);
        assert!(matches!(anchor("^x$"), Cow::Borrowed(_)));
    }

    #[test]
    fn anchor_treats_escaped_dollar_as_literal() {
        assert_eq!(anchor("cost\\$"), "^cost\\$$");
        assert_eq!(anchor("cost\\\\$"), "^cost\\\\$");
    }

    #[test]
    fn cache_compiles_once() {
        let cache = PatternCache::new();
        let first = cache.get_or_compile("data\\..*").unwrap();
        let second = cache.get_or_compile("data\\..*").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(cache.len(), 1);
        assert!(first.is_match("data.email"));
        assert!(!first.is_match("meta.data.email"));
    }

    #[test]
    fn cache_rejects_invalid_pattern() {
        let cache = PatternCache::new();
        let err = cache.get_or_compile("items[").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPattern { ref key, .. } if key == "items["));
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_is_shared_across_threads() {
        let cache = Arc::new(PatternCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let regex = cache.get_or_compile("items\\.\\d+\\.name").unwrap();
                    regex.is_match(&format!("items.{}.name", i))
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 1);
    }
}
