//! Free-text search over in-memory lists, with debouncing.
//!
//! Matching is case-insensitive substring containment over named string
//! fields of a serializable item, or a caller-supplied predicate. Non-string
//! field values never match. [`OptimizedSearch`] adds a fixed debounce
//! window so that rapidly changing input is only applied once it settles.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How long a search term must stay unchanged before it is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default page size for list endpoints.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Maximum page size for list endpoints.
pub const MAX_LIST_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Pagination helpers
// ---------------------------------------------------------------------------

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

type Predicate<T> = Box<dyn Fn(&T, &str) -> bool + Send + Sync>;

/// How items are matched against a search term.
pub enum SearchMatcher<T> {
    /// Case-insensitive containment in any of the named top-level fields.
    Fields(Vec<String>),
    /// Custom predicate; receives the item and the lowercased, trimmed term.
    Predicate(Predicate<T>),
}

impl<T> SearchMatcher<T> {
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SearchMatcher::Fields(names.into_iter().map(Into::into).collect())
    }

    pub fn predicate(f: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        SearchMatcher::Predicate(Box::new(f))
    }
}

impl<T> fmt::Debug for SearchMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMatcher::Fields(names) => f.debug_tuple("Fields").field(names).finish(),
            SearchMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Whether any named string field of `item` contains `needle`.
///
/// `needle` must already be lowercased.
fn fields_match(item: &Value, fields: &[String], needle: &str) -> bool {
    fields.iter().any(|name| match item.get(name) {
        Some(Value::String(s)) => s.to_lowercase().contains(needle),
        _ => false,
    })
}

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Filter `items` by `term`. A blank term returns every item.
pub fn filter_items<'a, T: Serialize>(
    items: &'a [T],
    matcher: &SearchMatcher<T>,
    term: &str,
) -> Vec<&'a T> {
    let needle = normalize_term(term);
    if needle.is_empty() {
        return items.iter().collect();
    }
    match matcher {
        SearchMatcher::Fields(fields) => items
            .iter()
            .filter(|item| {
                serde_json::to_value(item)
                    .map(|v| fields_match(&v, fields, &needle))
                    .unwrap_or(false)
            })
            .collect(),
        SearchMatcher::Predicate(pred) => items.iter().filter(|item| pred(item, &needle)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Debounced search
// ---------------------------------------------------------------------------

/// A debounced, filtered view over a list.
///
/// Times are passed in explicitly so the debounce is deterministic under
/// test; the `*_now` convenience wrappers use [`Instant::now`].
pub struct OptimizedSearch<T> {
    items: Vec<T>,
    matcher: SearchMatcher<T>,
    delay: Duration,
    applied_term: String,
    pending: Option<(String, Instant)>,
}

impl<T: Serialize + Clone> OptimizedSearch<T> {
    pub fn new(items: Vec<T>, matcher: SearchMatcher<T>) -> Self {
        Self::with_delay(items, matcher, SEARCH_DEBOUNCE)
    }

    pub fn with_delay(items: Vec<T>, matcher: SearchMatcher<T>, delay: Duration) -> Self {
        Self {
            items,
            matcher,
            delay,
            applied_term: String::new(),
            pending: None,
        }
    }

    /// Replace the underlying list. The applied term is kept.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Record a new term typed at `at`. Restarts the debounce window.
    pub fn set_term(&mut self, term: impl Into<String>, at: Instant) {
        self.pending = Some((term.into(), at));
    }

    pub fn set_term_now(&mut self, term: impl Into<String>) {
        self.set_term(term, Instant::now());
    }

    /// True while a term is pending and its debounce window has not elapsed.
    pub fn is_searching(&self, now: Instant) -> bool {
        match &self.pending {
            Some((_, at)) => now.saturating_duration_since(*at) < self.delay,
            None => false,
        }
    }

    /// The term currently applied to the results.
    pub fn applied_term(&self) -> &str {
        &self.applied_term
    }

    /// Apply the pending term if its window has elapsed. Returns whether
    /// the applied term changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let ready = matches!(&self.pending, Some((_, at)) if now.saturating_duration_since(*at) >= self.delay);
        if !ready {
            return false;
        }
        let Some((term, _)) = self.pending.take() else {
            return false;
        };
        let changed = term != self.applied_term;
        self.applied_term = term;
        changed
    }

    /// Filtered results as of `now`, applying a settled pending term first.
    pub fn results(&mut self, now: Instant) -> Vec<T> {
        self.tick(now);
        filter_items(&self.items, &self.matcher, &self.applied_term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn results_now(&mut self) -> Vec<T> {
        self.results(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Debug, Clone, Serialize, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    fn people() -> Vec<Person> {
        vec![
            Person {
                name: "Juan Pérez".into(),
                age: 40,
            },
            Person {
                name: "María García".into(),
                age: 35,
            },
        ]
    }

    #[test]
    fn debounced_term_applies_after_window() {
        let mut search = OptimizedSearch::new(people(), SearchMatcher::fields(["name"]));
        let t0 = Instant::now();
        search.set_term("juan", t0);

        assert!(search.is_searching(t0 + Duration::from_millis(100)));
        assert_eq!(search.results(t0 + Duration::from_millis(100)).len(), 2);

        let later = t0 + Duration::from_millis(301);
        assert!(!search.is_searching(later));
        let results = search.results(later);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Juan Pérez");
    }

    #[test]
    fn retyping_restarts_window() {
        let mut search = OptimizedSearch::new(people(), SearchMatcher::fields(["name"]));
        let t0 = Instant::now();
        search.set_term("ju", t0);
        search.set_term("mar", t0 + Duration::from_millis(250));
        assert!(search.is_searching(t0 + Duration::from_millis(400)));
        assert!(!search.tick(t0 + Duration::from_millis(400)));
        assert!(search.tick(t0 + Duration::from_millis(551)));
        assert_eq!(search.applied_term(), "mar");
    }

    #[test]
    fn matching_is_case_insensitive_and_accent_preserving() {
        let items = people();
        let matcher = SearchMatcher::fields(["name"]);
        assert_eq!(filter_items(&items, &matcher, "GARCÍA").len(), 1);
        assert_eq!(filter_items(&items, &matcher, "garcia").len(), 0);
    }

    #[test]
    fn non_string_fields_never_match() {
        let items = people();
        let matcher = SearchMatcher::fields(["age"]);
        assert!(filter_items(&items, &matcher, "40").is_empty());
    }

    #[test]
    fn blank_term_returns_everything() {
        let items = people();
        let matcher = SearchMatcher::fields(["name"]);
        assert_eq!(filter_items(&items, &matcher, "   ").len(), 2);
    }

    #[test]
    fn predicate_matcher_receives_lowercased_term() {
        let items = people();
        let matcher = SearchMatcher::predicate(|p: &Person, term: &str| {
            term == "adult" && p.age >= 40
        });
        let hits = filter_items(&items, &matcher, " ADULT ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].age, 40);
    }

    #[test]
    fn clamp_helpers() {
        assert_eq!(clamp_limit(None, 50, 100), 50);
        assert_eq!(clamp_limit(Some(500), 50, 100), 100);
        assert_eq!(clamp_limit(Some(0), 50, 100), 1);
        assert_eq!(clamp_offset(Some(-5)), 0);
    }
}
