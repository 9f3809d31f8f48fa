//! Memoized derivations over the record list and the filter state.
//!
//! Every chart reads a record subset that applies all filter dimensions except the one
//! the chart itself plots, so selecting a bar never collapses its own chart. The subsets
//! are declared once in [`plan`] and share a single key shape: the record list handle
//! plus one optional handle per dimension, absent for dimensions the subset ignores.
//! A node therefore recomputes only when a handle it actually reads is replaced.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use taskboard_core::palette::{category_color, status_color};
use taskboard_core::{Category, Criteria, DateRange, Dimension, FilterState, Status, Task, format_date};
use time::Date;

use crate::memo::{Identity, Memo};

/// Shared handle to a list of tasks.
pub type TaskList = Arc<Vec<Task>>;

/// Which dimensions each record subset applies.
pub mod plan {
    use taskboard_core::Dimension::{self, Category, Date, Search, Status};

    /// The table, the stats card, and the committed timeline.
    pub const FILTERED: &[Dimension] = &Dimension::ALL;
    /// Status chart: everything but status.
    pub const STATUS_CHART: &[Dimension] = &[Category, Date, Search];
    /// Category chart: everything but category.
    pub const CATEGORY_CHART: &[Dimension] = &[Status, Date, Search];
    /// Timeline while a new range is being picked: everything but the date range.
    pub const TIMELINE_SELECTING: &[Dimension] = &[Status, Category, Search];
}

/// One chart bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataPoint {
    /// Bucket label (the domain value's wire form).
    pub name: String,
    /// Number of tasks in the bucket.
    pub value: usize,
    /// Display colour.
    pub fill: &'static str,
}

/// One timeline bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineDataPoint {
    /// Calendar day.
    #[serde(with = "taskboard_core::date::iso_date")]
    pub date: Date,
    /// Number of tasks on that day.
    pub count: usize,
}

/// Per-status counts with every canonical status present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    /// `todo` count.
    pub todo: usize,
    /// `in-progress` count.
    pub in_progress: usize,
    /// `done` count.
    pub done: usize,
    /// `blocked` count.
    pub blocked: usize,
}

/// Summary over the fully filtered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Record count.
    pub total: usize,
    /// Sum of `amount`.
    pub total_amount: f64,
    /// Canonical status breakdown.
    pub by_status: StatusBreakdown,
}

#[derive(Clone)]
struct SubsetKey {
    tasks: TaskList,
    statuses: Option<Arc<Vec<Status>>>,
    categories: Option<Arc<Vec<Category>>>,
    date_range: Option<Arc<DateRange>>,
    query: Option<Arc<str>>,
}

impl SubsetKey {
    fn project(tasks: &TaskList, filters: &FilterState, dimensions: &[Dimension]) -> Self {
        let has = |dim| dimensions.contains(&dim);
        Self {
            tasks: Arc::clone(tasks),
            statuses: has(Dimension::Status).then(|| Arc::clone(filters.shared_statuses())),
            categories: has(Dimension::Category).then(|| Arc::clone(filters.shared_categories())),
            date_range: has(Dimension::Date).then(|| Arc::clone(filters.shared_date_range())),
            query: has(Dimension::Search).then(|| Arc::clone(filters.shared_search_query())),
        }
    }

    fn select(&self) -> TaskList {
        let criteria = Criteria::new(
            self.statuses.as_deref().map(Vec::as_slice),
            self.categories.as_deref().map(Vec::as_slice),
            self.date_range.as_deref(),
            self.query.as_deref(),
        );
        if criteria.is_unconstrained() {
            return Arc::clone(&self.tasks);
        }
        Arc::new(
            self.tasks
                .iter()
                .filter(|task| criteria.accepts(task))
                .cloned()
                .collect(),
        )
    }
}

impl Identity for SubsetKey {
    fn same(&self, other: &Self) -> bool {
        self.tasks.same(&other.tasks)
            && self.statuses.same(&other.statuses)
            && self.categories.same(&other.categories)
            && self.date_range.same(&other.date_range)
            && self.query.same(&other.query)
    }
}

/// Owner of every derivation cache.
///
/// Calls with unchanged inputs return pointer-identical outputs; replacing an input
/// handle yields fresh outputs for exactly the nodes that read it.
#[derive(Debug)]
pub struct DerivationEngine {
    filtered: Memo<SubsetKey, Vec<Task>>,
    excluding_status: Memo<SubsetKey, Vec<Task>>,
    excluding_category: Memo<SubsetKey, Vec<Task>>,
    excluding_date: Memo<SubsetKey, Vec<Task>>,
    status_distribution: Memo<(TaskList,), Vec<ChartDataPoint>>,
    category_distribution: Memo<(TaskList,), Vec<ChartDataPoint>>,
    timeline: Memo<(TaskList,), Vec<TimelineDataPoint>>,
    timeline_unfiltered: Memo<(TaskList,), Vec<TimelineDataPoint>>,
    stats: Memo<(TaskList,), TaskStats>,
}

impl Default for DerivationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivationEngine {
    /// Engine with empty caches.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filtered: Memo::new("filtered_tasks"),
            excluding_status: Memo::new("tasks_excluding_status"),
            excluding_category: Memo::new("tasks_excluding_category"),
            excluding_date: Memo::new("tasks_excluding_date"),
            status_distribution: Memo::new("status_distribution"),
            category_distribution: Memo::new("category_distribution"),
            timeline: Memo::new("timeline_data"),
            timeline_unfiltered: Memo::new("timeline_data_unfiltered"),
            stats: Memo::new("task_stats"),
        }
    }

    fn subset(memo: &Memo<SubsetKey, Vec<Task>>, tasks: &TaskList, filters: &FilterState, dims: &[Dimension]) -> TaskList {
        memo.get_or_compute(SubsetKey::project(tasks, filters, dims), SubsetKey::select)
    }

    /// Records passing every active filter.
    #[must_use]
    pub fn filtered_tasks(&self, tasks: &TaskList, filters: &FilterState) -> TaskList {
        Self::subset(&self.filtered, tasks, filters, plan::FILTERED)
    }

    /// Records passing every filter except the status selection.
    #[must_use]
    pub fn tasks_excluding_status(&self, tasks: &TaskList, filters: &FilterState) -> TaskList {
        Self::subset(&self.excluding_status, tasks, filters, plan::STATUS_CHART)
    }

    /// Records passing every filter except the category selection.
    #[must_use]
    pub fn tasks_excluding_category(&self, tasks: &TaskList, filters: &FilterState) -> TaskList {
        Self::subset(&self.excluding_category, tasks, filters, plan::CATEGORY_CHART)
    }

    /// Records passing every filter except the date range.
    #[must_use]
    pub fn tasks_excluding_date(&self, tasks: &TaskList, filters: &FilterState) -> TaskList {
        Self::subset(&self.excluding_date, tasks, filters, plan::TIMELINE_SELECTING)
    }

    /// Status chart buckets in first-encounter order.
    #[must_use]
    pub fn status_distribution(&self, tasks: &TaskList, filters: &FilterState) -> Arc<Vec<ChartDataPoint>> {
        let subset = self.tasks_excluding_status(tasks, filters);
        self.status_distribution
            .get_or_compute((subset,), |(subset,)| Arc::new(count_by_status(subset)))
    }

    /// Category chart buckets in first-encounter order.
    #[must_use]
    pub fn category_distribution(&self, tasks: &TaskList, filters: &FilterState) -> Arc<Vec<ChartDataPoint>> {
        let subset = self.tasks_excluding_category(tasks, filters);
        self.category_distribution
            .get_or_compute((subset,), |(subset,)| Arc::new(count_by_category(subset)))
    }

    /// Timeline over the fully filtered records.
    #[must_use]
    pub fn timeline_data(&self, tasks: &TaskList, filters: &FilterState) -> Arc<Vec<TimelineDataPoint>> {
        let subset = self.filtered_tasks(tasks, filters);
        self.timeline
            .get_or_compute((subset,), |(subset,)| Arc::new(bucket_by_date(subset)))
    }

    /// Timeline ignoring the date range, shown while a new range is being picked.
    #[must_use]
    pub fn timeline_data_unfiltered(
        &self,
        tasks: &TaskList,
        filters: &FilterState,
    ) -> Arc<Vec<TimelineDataPoint>> {
        let subset = self.tasks_excluding_date(tasks, filters);
        self.timeline_unfiltered
            .get_or_compute((subset,), |(subset,)| Arc::new(bucket_by_date(subset)))
    }

    /// Summary statistics over the fully filtered records.
    #[must_use]
    pub fn task_stats(&self, tasks: &TaskList, filters: &FilterState) -> Arc<TaskStats> {
        let subset = self.filtered_tasks(tasks, filters);
        self.stats
            .get_or_compute((subset,), |(subset,)| Arc::new(summarize(subset)))
    }
}

fn distribution<K, F, L, C>(tasks: &[Task], key: F, label: L, color: C) -> Vec<ChartDataPoint>
where
    K: Hash + Eq,
    F: Fn(&Task) -> &K,
    L: Fn(&K) -> &str,
    C: Fn(&K) -> &'static str,
{
    let mut counts: IndexMap<&K, usize> = IndexMap::new();
    for task in tasks {
        *counts.entry(key(task)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(value, count)| ChartDataPoint {
            name: label(value).to_owned(),
            value: count,
            fill: color(value),
        })
        .collect()
}

/// Count tasks per status, keeping the order in which statuses first appear.
#[must_use]
pub fn count_by_status(tasks: &[Task]) -> Vec<ChartDataPoint> {
    distribution(tasks, |task| &task.status, Status::as_str, status_color)
}

/// Count tasks per category, keeping the order in which categories first appear.
#[must_use]
pub fn count_by_category(tasks: &[Task]) -> Vec<ChartDataPoint> {
    distribution(tasks, |task| &task.category, Category::as_str, category_color)
}

/// Count tasks per calendar day, sorted ascending by the ISO date string.
#[must_use]
pub fn bucket_by_date(tasks: &[Task]) -> Vec<TimelineDataPoint> {
    let mut counts: IndexMap<Date, usize> = IndexMap::new();
    for task in tasks {
        *counts.entry(task.date).or_default() += 1;
    }
    let mut points: Vec<TimelineDataPoint> = counts
        .into_iter()
        .map(|(date, count)| TimelineDataPoint { date, count })
        .collect();
    points.sort_by_cached_key(|point| format_date(point.date));
    points
}

/// Total, amount sum, and canonical status breakdown.
#[must_use]
pub fn summarize(tasks: &[Task]) -> TaskStats {
    let mut by_status = StatusBreakdown::default();
    for task in tasks {
        match task.status {
            Status::Todo => by_status.todo += 1,
            Status::InProgress => by_status.in_progress += 1,
            Status::Done => by_status.done += 1,
            Status::Blocked => by_status.blocked += 1,
            Status::Unknown(_) => {}
        }
    }
    TaskStats {
        total: tasks.len(),
        total_amount: tasks.iter().map(|task| task.amount).sum(),
        by_status,
    }
}
