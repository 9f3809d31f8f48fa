use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use time::{Date, Duration};

use crate::task::{Category, Status};

/// Date interval; either bound may be absent, meaning unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound.
    #[serde(default, with = "crate::date::iso_date::option")]
    pub start: Option<Date>,
    /// Inclusive upper bound.
    #[serde(default, with = "crate::date::iso_date::option")]
    pub end: Option<Date>,
}

impl DateRange {
    /// Range with both bounds unset.
    pub const UNBOUNDED: Self = Self {
        start: None,
        end: None,
    };

    /// Construct a range from optional bounds.
    #[must_use]
    pub const fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// Closed range `[start, end]`.
    #[must_use]
    pub const fn between(start: Date, end: Date) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns true when at least one bound is set.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Inclusive containment check. An inverted closed range contains nothing.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            (Some(start), None) => date >= start,
            (None, Some(end)) => date <= end,
            (None, None) => true,
        }
    }
}

/// Operations accepted by [`FilterState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    /// Add the status if absent, remove it otherwise.
    ToggleStatus(Status),
    /// Add the category if absent, remove it otherwise.
    ToggleCategory(Category),
    /// Overwrite the date range.
    SetDateRange(DateRange),
    /// Overwrite the search query.
    SetSearchQuery(String),
    /// Empty every field.
    ClearFilters,
    /// Restore the canonical empty state.
    ResetFilters,
}

/// Active selection criteria.
///
/// Every field sits behind its own [`Arc`]. Operations replace only the fields they touch,
/// so untouched fields stay pointer-identical across updates and memoized derivations can
/// depend on individual fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    selected_statuses: Arc<Vec<Status>>,
    selected_categories: Arc<Vec<Category>>,
    date_range: Arc<DateRange>,
    search_query: Arc<str>,
}

impl FilterState {
    /// Canonical empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from explicit field values.
    #[must_use]
    pub fn from_parts(
        statuses: Vec<Status>,
        categories: Vec<Category>,
        date_range: DateRange,
        search_query: &str,
    ) -> Self {
        Self {
            selected_statuses: Arc::new(statuses),
            selected_categories: Arc::new(categories),
            date_range: Arc::new(date_range),
            search_query: Arc::from(search_query),
        }
    }

    /// Selected statuses in first-selection order.
    #[must_use]
    pub fn selected_statuses(&self) -> &[Status] {
        &self.selected_statuses
    }

    /// Selected categories in first-selection order.
    #[must_use]
    pub fn selected_categories(&self) -> &[Category] {
        &self.selected_categories
    }

    /// Current date interval.
    #[must_use]
    pub fn date_range(&self) -> DateRange {
        *self.date_range
    }

    /// Current free-text query, unmodified.
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Shared handle to the status selection.
    #[must_use]
    pub const fn shared_statuses(&self) -> &Arc<Vec<Status>> {
        &self.selected_statuses
    }

    /// Shared handle to the category selection.
    #[must_use]
    pub const fn shared_categories(&self) -> &Arc<Vec<Category>> {
        &self.selected_categories
    }

    /// Shared handle to the date range.
    #[must_use]
    pub const fn shared_date_range(&self) -> &Arc<DateRange> {
        &self.date_range
    }

    /// Shared handle to the search query.
    #[must_use]
    pub const fn shared_search_query(&self) -> &Arc<str> {
        &self.search_query
    }

    /// Toggle membership of `status`.
    pub fn toggle_status(&mut self, status: Status) {
        self.selected_statuses = Arc::new(toggled(&self.selected_statuses, status));
    }

    /// Toggle membership of `category`.
    pub fn toggle_category(&mut self, category: Category) {
        self.selected_categories = Arc::new(toggled(&self.selected_categories, category));
    }

    /// Replace the date range wholesale.
    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = Arc::new(range);
    }

    /// Replace the search query wholesale.
    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = Arc::from(query);
    }

    /// Empty all four fields.
    pub fn clear_filters(&mut self) {
        self.selected_statuses = Arc::new(Vec::new());
        self.selected_categories = Arc::new(Vec::new());
        self.date_range = Arc::new(DateRange::UNBOUNDED);
        self.search_query = Arc::from("");
    }

    /// Restore the canonical empty state.
    pub fn reset_filters(&mut self) {
        *self = Self::new();
    }

    /// Apply a single operation.
    pub fn apply(&mut self, action: FilterAction) {
        match action {
            FilterAction::ToggleStatus(status) => self.toggle_status(status),
            FilterAction::ToggleCategory(category) => self.toggle_category(category),
            FilterAction::SetDateRange(range) => self.set_date_range(range),
            FilterAction::SetSearchQuery(query) => self.set_search_query(&query),
            FilterAction::ClearFilters => self.clear_filters(),
            FilterAction::ResetFilters => self.reset_filters(),
        }
    }

    /// True when a status, a category, or a date bound is selected.
    ///
    /// The search query is not counted.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.selected_statuses.is_empty()
            || !self.selected_categories.is_empty()
            || self.date_range.is_bounded()
    }

    /// True when no field constrains the record set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_filters() && self.search_query.trim().is_empty()
    }
}

fn toggled<T: PartialEq + Clone>(current: &[T], value: T) -> Vec<T> {
    let mut next = current.to_vec();
    if let Some(index) = next.iter().position(|item| *item == value) {
        next.remove(index);
        return next;
    }
    next.push(value);
    next
}

/// Quick date-range shortcuts offered next to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangePreset {
    /// `[today - 7 days, today]`.
    Last7Days,
    /// `[today - 30 days, today]`.
    Last30Days,
    /// No bounds.
    AllTime,
}

/// Error returned for unrecognised preset names.
#[derive(Debug, Error)]
#[error("unknown date range preset: {0} (expected 7days, 30days, or all)")]
pub struct UnknownPresetError(String);

impl DateRangePreset {
    pub const ALL: [Self; 3] = [Self::Last7Days, Self::Last30Days, Self::AllTime];

    /// Name accepted by `FromStr`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Last7Days => "7days",
            Self::Last30Days => "30days",
            Self::AllTime => "all",
        }
    }

    /// Preset whose range equals `range` today, if any.
    #[must_use]
    pub fn matching(range: &DateRange, today: Date) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.is_active(range, today))
    }

    /// Range the preset selects relative to `today`.
    #[must_use]
    pub fn range(self, today: Date) -> DateRange {
        let days_back = match self {
            Self::Last7Days => 7,
            Self::Last30Days => 30,
            Self::AllTime => return DateRange::UNBOUNDED,
        };
        let start = today.checked_sub(Duration::days(days_back)).unwrap_or(Date::MIN);
        DateRange::between(start, today)
    }

    /// Whether `range` is exactly what this preset would select today.
    #[must_use]
    pub fn is_active(self, range: &DateRange, today: Date) -> bool {
        match self {
            Self::AllTime => !range.is_bounded(),
            _ => *range == self.range(today),
        }
    }
}

impl FromStr for DateRangePreset {
    type Err = UnknownPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| UnknownPresetError(name.to_owned()))
    }
}
