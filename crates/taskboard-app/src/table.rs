//! Local search, sorting, and pagination over the filtered records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taskboard_core::{Task, TextMatcher};
use thiserror::Error;
use time::Date;

use crate::engine::TaskList;
use crate::memo::Memo;

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Task title, case-insensitive.
    Title,
    /// Category label, case-insensitive.
    Category,
    /// Status label, case-insensitive.
    Status,
    /// Calendar date.
    Date,
    /// Numeric amount.
    Amount,
}

impl SortField {
    /// Column name as shown in headers and accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Category => "category",
            Self::Status => "status",
            Self::Date => "date",
            Self::Amount => "amount",
        }
    }

    fn key(self, task: &Task) -> SortKey {
        match self {
            Self::Title => SortKey::Text(task.title.to_lowercase()),
            Self::Category => SortKey::Text(task.category.as_str().to_lowercase()),
            Self::Status => SortKey::Text(task.status.as_str().to_lowercase()),
            Self::Date => SortKey::Date(task.date),
            Self::Amount => SortKey::Amount(task.amount),
        }
    }
}

/// Per-row sort key, computed once before sorting.
enum SortKey {
    Text(String),
    Date(Date),
    Amount(f64),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Amount(a), Self::Amount(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a column name is not recognised.
#[derive(Debug, Error)]
#[error("unknown sort field '{0}' (expected title, category, status, date or amount)")]
pub struct UnknownSortFieldError(String);

impl FromStr for SortField {
    type Err = UnknownSortFieldError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "category" => Ok(Self::Category),
            "status" => Ok(Self::Status),
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            _ => Err(UnknownSortFieldError(raw.to_owned())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Largest first.
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    /// Column.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Descending,
        }
    }
}

/// One rendered page of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    /// Rows on this page, at most one page size.
    pub rows: Vec<Task>,
    /// Effective 1-based page number.
    pub page: usize,
    /// Page count for the searched rows; zero when nothing matches.
    pub total_pages: usize,
    /// Rows matching the local search.
    pub matching: usize,
    /// Rows handed to the table before the local search.
    pub total: usize,
    /// Sort used to order the rows.
    pub sort: SortOrder,
}

impl TablePage {
    /// Header caption, e.g. `Tasks (3 of 23)`.
    #[must_use]
    pub fn caption(&self) -> String {
        format!("Tasks ({} of {})", self.matching, self.total)
    }
}

/// Table controller state.
///
/// Holds the local search text, the sort order, and the requested page. The searched
/// and sorted row lists are cached against the input list reference.
#[derive(Debug)]
pub struct TableView {
    page_size: usize,
    page: usize,
    search: Arc<str>,
    sort: Arc<SortOrder>,
    search_memo: Memo<(TaskList, Arc<str>), Vec<Task>>,
    sort_memo: Memo<(TaskList, Arc<SortOrder>), Vec<Task>>,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TableView {
    /// Table showing `page_size` rows per page. A zero size is treated as one.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            search: Arc::from(""),
            sort: Arc::new(SortOrder::default()),
            search_memo: Memo::new("table_searched"),
            sort_memo: Memo::new("table_sorted"),
        }
    }

    /// Requested page before clamping.
    #[must_use]
    pub const fn requested_page(&self) -> usize {
        self.page
    }

    /// Current local search text.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Current sort.
    #[must_use]
    pub fn sort(&self) -> SortOrder {
        *self.sort
    }

    /// Header click: flip the direction of the active column, or switch to `field`
    /// ascending. Always returns to page 1.
    pub fn sort_by(&mut self, field: SortField) {
        let current = *self.sort;
        let next = if current.field == field {
            SortOrder {
                field,
                direction: current.direction.flipped(),
            }
        } else {
            SortOrder {
                field,
                direction: SortDirection::Ascending,
            }
        };
        self.set_sort(next);
    }

    /// Set column and direction directly. Returns to page 1.
    pub fn set_sort(&mut self, order: SortOrder) {
        self.sort = Arc::new(order);
        self.page = 1;
    }

    /// Replace the local search text. Returns to page 1.
    pub fn set_search(&mut self, text: &str) {
        self.search = Arc::from(text);
        self.page = 1;
    }

    /// Jump to `page`, clamped to the pages available for `tasks`. Returns the page kept.
    pub fn set_page(&mut self, tasks: &TaskList, page: usize) -> usize {
        let last = self.total_pages(tasks).max(1);
        self.page = page.clamp(1, last);
        self.page
    }

    /// Advance one page, stopping at the last one.
    pub fn next_page(&mut self, tasks: &TaskList) -> usize {
        self.set_page(tasks, self.page.saturating_add(1))
    }

    /// Go back one page, stopping at the first one.
    pub fn previous_page(&mut self, tasks: &TaskList) -> usize {
        self.set_page(tasks, self.page.saturating_sub(1))
    }

    /// Number of pages after the local search.
    #[must_use]
    pub fn total_pages(&self, tasks: &TaskList) -> usize {
        self.searched(tasks).len().div_ceil(self.page_size)
    }

    /// Rows of `tasks` that pass the local search, in input order.
    #[must_use]
    pub fn searched(&self, tasks: &TaskList) -> TaskList {
        let key = (Arc::clone(tasks), Arc::clone(&self.search));
        self.search_memo.get_or_compute(key, |(tasks, search)| {
            TextMatcher::new(search).map_or_else(
                || Arc::clone(tasks),
                |matcher| Arc::new(tasks.iter().filter(|task| matcher.matches(task)).cloned().collect()),
            )
        })
    }

    /// Searched rows in the active sort order. The sort is stable.
    #[must_use]
    pub fn sorted(&self, tasks: &TaskList) -> TaskList {
        let key = (self.searched(tasks), Arc::clone(&self.sort));
        self.sort_memo.get_or_compute(key, |(rows, order)| {
            let SortOrder { field, direction } = **order;
            let mut keyed: Vec<(SortKey, &Task)> = rows.iter().map(|task| (field.key(task), task)).collect();
            keyed.sort_by(|(a, _), (b, _)| {
                let ordering = a.compare(b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
            Arc::new(keyed.into_iter().map(|(_, task)| task.clone()).collect())
        })
    }

    /// Render the current page of `tasks`.
    #[must_use]
    pub fn page(&self, tasks: &TaskList) -> TablePage {
        let sorted = self.sorted(tasks);
        let total_pages = sorted.len().div_ceil(self.page_size);
        let page = self.page.clamp(1, total_pages.max(1));
        let start = (page - 1) * self.page_size;
        let rows = sorted.iter().skip(start).take(self.page_size).cloned().collect();
        TablePage {
            rows,
            page,
            total_pages,
            matching: sorted.len(),
            total: tasks.len(),
            sort: *self.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::{Category, Status, TaskId};
    use time::{Date, Duration, macros::date};

    fn row(n: usize, title: &str, amount: f64, date: Date) -> Task {
        Task {
            id: TaskId::sequential(n),
            title: title.into(),
            category: Category::A,
            status: Status::Todo,
            date,
            amount,
        }
    }

    fn rows(count: usize) -> TaskList {
        let base = date!(2025 - 01 - 01);
        Arc::new(
            (1..=count)
                .map(|n| {
                    let offset = i64::try_from(n).unwrap_or_else(|err| panic!("offset: {err}"));
                    row(n, &format!("Task {n}"), 10.0, base + Duration::days(offset))
                })
                .collect(),
        )
    }

    fn ids(page: &TablePage) -> Vec<&str> {
        page.rows.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn twenty_three_rows_make_three_pages() {
        let tasks = rows(23);
        let mut table = TableView::default();

        assert_eq!(table.total_pages(&tasks), 3);
        assert_eq!(table.set_page(&tasks, 3), 3);
        let page = table.page(&tasks);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.caption(), "Tasks (23 of 23)");
    }

    #[test]
    fn page_requests_are_clamped() {
        let tasks = rows(23);
        let mut table = TableView::default();

        assert_eq!(table.set_page(&tasks, 0), 1);
        assert_eq!(table.set_page(&tasks, 4), 3);
        assert_eq!(table.next_page(&tasks), 3);
        table.set_page(&tasks, 1);
        assert_eq!(table.previous_page(&tasks), 1);
        assert_eq!(table.next_page(&tasks), 2);
    }

    #[test]
    fn empty_input_renders_page_one_of_zero() {
        let tasks: TaskList = Arc::new(Vec::new());
        let mut table = TableView::default();
        assert_eq!(table.set_page(&tasks, 5), 1);
        let page = table.page(&tasks);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn default_sort_is_newest_first() {
        let tasks = rows(3);
        let table = TableView::default();
        assert_eq!(ids(&table.page(&tasks)), vec!["task-3", "task-2", "task-1"]);
    }

    #[test]
    fn clicking_headers_toggles_or_switches_column() {
        let mut table = TableView::default();
        table.sort_by(SortField::Date);
        assert_eq!(table.sort().direction, SortDirection::Ascending);
        table.sort_by(SortField::Date);
        assert_eq!(table.sort().direction, SortDirection::Descending);
        table.sort_by(SortField::Amount);
        assert_eq!(
            table.sort(),
            SortOrder {
                field: SortField::Amount,
                direction: SortDirection::Ascending,
            }
        );
    }

    #[test]
    fn search_and_sort_reset_pagination() {
        let tasks = rows(23);
        let mut table = TableView::default();
        table.set_page(&tasks, 3);
        table.sort_by(SortField::Title);
        assert_eq!(table.requested_page(), 1);

        table.set_page(&tasks, 2);
        table.set_search("task 1");
        assert_eq!(table.requested_page(), 1);
    }

    #[test]
    fn titles_sort_case_insensitively_and_stably() {
        let day = date!(2025 - 03 - 01);
        let tasks: TaskList = Arc::new(vec![
            row(1, "beta", 1.0, day),
            row(2, "Alpha", 2.0, day),
            row(3, "alpha", 3.0, day),
            row(4, "Gamma", 4.0, day),
        ]);
        let mut table = TableView::default();
        table.sort_by(SortField::Title);
        assert_eq!(ids(&table.page(&tasks)), vec!["task-2", "task-3", "task-1", "task-4"]);

        table.sort_by(SortField::Title);
        assert_eq!(ids(&table.page(&tasks)), vec!["task-4", "task-1", "task-2", "task-3"]);
    }

    #[test]
    fn status_column_sorts_on_lowercased_labels() {
        let day = date!(2025 - 03 - 01);
        let mut blocked = row(1, "a", 1.0, day);
        blocked.status = Status::Blocked;
        let mut archived = row(2, "b", 1.0, day);
        archived.status = Status::Unknown("Archived".into());
        let mut done = row(3, "c", 1.0, day);
        done.status = Status::Done;
        let tasks: TaskList = Arc::new(vec![blocked, archived, done]);

        let mut table = TableView::default();
        table.sort_by(SortField::Status);
        assert_eq!(ids(&table.page(&tasks)), vec!["task-2", "task-1", "task-3"]);
    }

    #[test]
    fn amounts_sort_numerically() {
        let day = date!(2025 - 03 - 01);
        let tasks: TaskList = Arc::new(vec![
            row(1, "a", 100.0, day),
            row(2, "b", 9.5, day),
            row(3, "c", 20.0, day),
        ]);
        let mut table = TableView::default();
        table.sort_by(SortField::Amount);
        assert_eq!(ids(&table.page(&tasks)), vec!["task-2", "task-3", "task-1"]);
    }

    #[test]
    fn local_search_narrows_rows_and_reports_counts() {
        let tasks = rows(23);
        let mut table = TableView::default();
        table.set_search("TASK 2");
        let page = table.page(&tasks);
        assert_eq!(page.matching, 5);
        assert_eq!(page.total, 23);
        assert_eq!(page.caption(), "Tasks (5 of 23)");
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn blank_search_keeps_the_input_reference() {
        let tasks = rows(4);
        let mut table = TableView::default();
        table.set_search("   ");
        assert!(Arc::ptr_eq(&table.searched(&tasks), &tasks));
    }

    #[test]
    fn unchanged_inputs_reuse_the_sorted_rows() {
        let tasks = rows(12);
        let mut table = TableView::new(5);
        let first = table.sorted(&tasks);
        table.set_page(&tasks, 2);
        assert!(Arc::ptr_eq(&first, &table.sorted(&tasks)));

        table.sort_by(SortField::Amount);
        assert!(!Arc::ptr_eq(&first, &table.sorted(&tasks)));
    }

    #[test]
    fn sort_field_parses_column_names() {
        assert_eq!("Amount".parse::<SortField>().ok(), Some(SortField::Amount));
        assert!("priority".parse::<SortField>().is_err());
    }
}
