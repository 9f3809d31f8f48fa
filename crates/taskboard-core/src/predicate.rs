use crate::filter::DateRange;
use crate::task::{Category, Status, Task};
use crate::text_matcher::TextMatcher;

/// One independently filterable facet of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Membership in the selected statuses.
    Status,
    /// Membership in the selected categories.
    Category,
    /// Containment in the date range.
    Date,
    /// Title substring search.
    Search,
}

impl Dimension {
    /// Every dimension, in application order.
    pub const ALL: [Self; 4] = [Self::Status, Self::Category, Self::Date, Self::Search];
}

/// Task status is one of `selected` (OR within the dimension).
#[must_use]
pub fn status_matches(selected: &[Status], task: &Task) -> bool {
    selected.contains(&task.status)
}

/// Task category is one of `selected`.
#[must_use]
pub fn category_matches(selected: &[Category], task: &Task) -> bool {
    selected.contains(&task.category)
}

/// Task date falls inside `range` (inclusive).
#[must_use]
pub fn date_matches(range: &DateRange, task: &Task) -> bool {
    range.contains(task.date)
}

/// Task title contains the query.
#[must_use]
pub fn search_matches(matcher: &TextMatcher, task: &Task) -> bool {
    matcher.matches(task)
}

/// AND-composition of the active predicates for a chosen set of dimensions.
///
/// Inactive inputs (empty selections, unbounded ranges, blank queries) are dropped at
/// construction so [`Criteria::is_unconstrained`] is cheap.
#[derive(Debug, Clone, Default)]
pub struct Criteria<'a> {
    statuses: Option<&'a [Status]>,
    categories: Option<&'a [Category]>,
    date_range: Option<DateRange>,
    matcher: Option<TextMatcher>,
}

impl<'a> Criteria<'a> {
    /// Compose from raw parts; `None` leaves the dimension out entirely.
    #[must_use]
    pub fn new(
        statuses: Option<&'a [Status]>,
        categories: Option<&'a [Category]>,
        date_range: Option<&DateRange>,
        query: Option<&str>,
    ) -> Self {
        Self {
            statuses: statuses.filter(|selected| !selected.is_empty()),
            categories: categories.filter(|selected| !selected.is_empty()),
            date_range: date_range.copied().filter(DateRange::is_bounded),
            matcher: query.and_then(TextMatcher::new),
        }
    }

    /// True when no predicate is active.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.statuses.is_none()
            && self.categories.is_none()
            && self.date_range.is_none()
            && self.matcher.is_none()
    }

    /// Evaluate status, category, date, then search.
    #[must_use]
    pub fn accepts(&self, task: &Task) -> bool {
        self.statuses.is_none_or(|selected| status_matches(selected, task))
            && self.categories.is_none_or(|selected| category_matches(selected, task))
            && self.date_range.as_ref().is_none_or(|range| date_matches(range, task))
            && self.matcher.as_ref().is_none_or(|matcher| search_matches(matcher, task))
    }
}
