//! Per-session response caches.
//!
//! Entries are keyed by [`SelectionState::cache_key`], optionally scoped to a
//! location, and live for the lifetime of the page. There is no eviction:
//! a user only tries a handful of filter combinations per visit. The owner
//! clears everything whenever the selection changes.
//!
//! # Cache Key Structure
//! - `diseases|sexes`: both sorted and comma joined
//! - `location|diseases|sexes`: for per-location caches
//!
//! [`SelectionState::cache_key`]: crate::SelectionState::cache_key

use crate::rates::{AllYearsData, CountryHistory};
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for ResponseCache<V> {
    fn default() -> Self {
        ResponseCache {
            entries: HashMap::new(),
        }
    }
}

impl<V> ResponseCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn put(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            debug!("Dropping {} cached responses", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The caches of one map page session.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    /// Every map frame, keyed by selection.
    pub all_years: ResponseCache<AllYearsData>,
    /// Hover graphs, keyed by location and selection.
    pub country_history: ResponseCache<CountryHistory>,
}

impl SessionCache {
    pub fn invalidate_all(&mut self) {
        self.all_years.invalidate_all();
        self.country_history.invalidate_all();
    }

    pub fn len(&self) -> usize {
        self.all_years.len() + self.country_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
