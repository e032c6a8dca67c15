//! Local text matching.
//!
//! The built-in matcher folds case and strips diacritics before comparing,
//! so `"cafe"` finds `"Café"`. A caller-supplied [`MatcherFn`] replaces it
//! entirely and sees the raw term.

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use horizon_select_core::logging::targets;

use crate::callbacks::{MatcherFn, guarded};
use crate::item::{Entry, Group, Item};

/// How the built-in matcher compares a term against item text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    /// Item text starts with the term.
    StartsWith,
    /// Item text equals the term.
    Exact,
    /// Item text contains the term.
    #[default]
    Contains,
}

/// Fold `text` for comparison: compatibility decomposition, combining marks
/// removed, lowercased.
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Predicate deciding which items a term selects.
#[derive(Clone, Default)]
pub struct TextMatcher {
    strategy: MatchStrategy,
    custom: Option<MatcherFn>,
}

impl TextMatcher {
    /// Built-in matcher with the given strategy.
    pub fn new(strategy: MatchStrategy) -> Self {
        Self {
            strategy,
            custom: None,
        }
    }

    /// Matcher that delegates every decision to `custom`.
    pub fn custom(custom: MatcherFn) -> Self {
        Self {
            strategy: MatchStrategy::default(),
            custom: Some(custom),
        }
    }

    /// The configured strategy (unused when a custom matcher is set).
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Whether `item` matches `term`.
    ///
    /// A custom matcher decides every term, blank ones included, and counts
    /// as no match if it panics. For the built-in matcher a blank term
    /// matches everything; otherwise it never matches a disabled item.
    pub fn matches(&self, term: &str, item: &Item) -> bool {
        if let Some(custom) = &self.custom {
            return guarded("matcher", || custom(term, item)).unwrap_or(false);
        }

        if term.trim().is_empty() {
            return true;
        }
        if item.disabled {
            return false;
        }

        let needle = fold(term.trim());
        let haystack = fold(&item.text);
        match self.strategy {
            MatchStrategy::StartsWith => haystack.starts_with(&needle),
            MatchStrategy::Exact => haystack == needle,
            MatchStrategy::Contains => haystack.contains(&needle),
        }
    }

    /// Filter a group-preserving list.
    ///
    /// A group survives only if at least one child matches, and then carries
    /// only the matching children. Group labels are never matched.
    pub fn search(&self, entries: &[Entry], term: &str) -> Vec<Entry> {
        let results: Vec<Entry> = entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Item(item) => self
                    .matches(term, item)
                    .then(|| Entry::Item(item.clone())),
                Entry::Group(group) => {
                    let children: Vec<Item> = group
                        .children
                        .iter()
                        .filter(|child| self.matches(term, child))
                        .cloned()
                        .collect();
                    (!children.is_empty()).then(|| {
                        Entry::Group(Group {
                            text: group.text.clone(),
                            children,
                        })
                    })
                }
            })
            .collect();

        tracing::trace!(
            target: targets::MATCHER,
            term,
            input = entries.len(),
            output = results.len(),
            "filtered entries"
        );
        results
    }
}

impl std::fmt::Debug for TextMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMatcher")
            .field("strategy", &self.strategy)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}
