use serde::{Deserialize, Serialize};

use crate::favorites::FavoriteSet;
use crate::mapper::EventRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilters {
    /// Lower-cased category value; empty means all categories.
    pub category: String,
    pub search_term: String,
    pub favorites_only: bool,
}

/// Partial update merged into [`FeedFilters`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPatch {
    pub category: Option<String>,
    pub search_term: Option<String>,
    pub favorites_only: Option<bool>,
}

impl FilterPatch {
    #[must_use]
    pub fn category(value: impl Into<String>) -> Self {
        Self {
            category: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn search(value: impl Into<String>) -> Self {
        Self {
            search_term: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn favorites_only(value: bool) -> Self {
        Self {
            favorites_only: Some(value),
            ..Self::default()
        }
    }
}

impl FeedFilters {
    fn merge(&mut self, patch: FilterPatch) {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(term) = patch.search_term {
            self.search_term = term;
        }
        if let Some(flag) = patch.favorites_only {
            self.favorites_only = flag;
        }
    }

    /// Conjunction of the favorites, category and search predicates.
    #[must_use]
    pub fn matches(&self, record: &EventRecord, favorites: &FavoriteSet) -> bool {
        if self.favorites_only && !favorites.contains(record.uuid.as_str()) {
            return false;
        }

        if !self.category.is_empty() && record.category != self.category.to_lowercase() {
            return false;
        }

        if !self.search_term.is_empty() {
            let needle = self.search_term.to_lowercase();
            let hit = [&record.title, &record.description, &record.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Full event list plus the filtered, paginated window the feed shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedState {
    all: Vec<EventRecord>,
    filtered: Vec<EventRecord>,
    display_count: usize,
    filters: FeedFilters,
    initial_count: usize,
    increment: usize,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(6, 3)
    }
}

impl FeedState {
    #[must_use]
    pub fn new(initial_count: usize, increment: usize) -> Self {
        Self {
            all: Vec::new(),
            filtered: Vec::new(),
            display_count: initial_count,
            filters: FeedFilters::default(),
            initial_count,
            increment: increment.max(1),
        }
    }

    pub fn load(&mut self, records: Vec<EventRecord>, favorites: &FavoriteSet) {
        self.all = records;
        self.filters = FeedFilters::default();
        self.refilter(favorites);
    }

    pub fn set_filter(&mut self, patch: FilterPatch, favorites: &FavoriteSet) {
        self.filters.merge(patch);
        self.refilter(favorites);
    }

    /// Recomputes `filtered` from `all` and resets the window, e.g. after a
    /// favorite was toggled while the favorites-only filter is on.
    pub fn refilter(&mut self, favorites: &FavoriteSet) {
        self.filtered = self
            .all
            .iter()
            .filter(|record| self.filters.matches(record, favorites))
            .cloned()
            .collect();
        self.display_count = self.initial_count;
    }

    pub fn load_more(&mut self) {
        if self.display_count >= self.filtered.len() {
            return;
        }
        self.display_count = (self.display_count + self.increment).min(self.filtered.len());
    }

    #[must_use]
    pub fn visible_slice(&self) -> &[EventRecord] {
        &self.filtered[..self.display_count.min(self.filtered.len())]
    }

    /// Whether the "See more" affordance should be shown.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.display_count < self.filtered.len()
    }

    #[must_use]
    pub fn all(&self) -> &[EventRecord] {
        &self.all
    }

    #[must_use]
    pub fn filtered(&self) -> &[EventRecord] {
        &self.filtered
    }

    #[must_use]
    pub fn filters(&self) -> &FeedFilters {
        &self.filters
    }

    #[must_use]
    pub fn display_count(&self) -> usize {
        self.display_count
    }

    #[must_use]
    pub fn find(&self, uuid: &str) -> Option<&EventRecord> {
        self.all.iter().find(|record| record.uuid.as_str() == uuid)
    }
}
