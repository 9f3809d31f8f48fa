//! Wiring of the record store, filter state, derivations, and collaborators.

use std::sync::Arc;

use serde::Serialize;
use taskboard_core::{DateRangePreset, FilterAction, FilterState, Task, TaskChanges, TaskDraft, TaskId};
use time::Date;
use time::macros::format_description;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TaskApi};
use crate::config::DashboardConfig;
use crate::engine::{ChartDataPoint, DerivationEngine, TaskList, TaskStats, TimelineDataPoint};
use crate::persistence::{FilterStorage, load_filters, save_filters};
use crate::store::{LoadState, RecordStore};
use crate::table::{TablePage, TableView};
use crate::timeline::TimelineBrush;

/// Both chart distributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    /// Status buckets.
    pub status: Arc<Vec<ChartDataPoint>>,
    /// Category buckets.
    pub category: Arc<Vec<ChartDataPoint>>,
}

/// Everything the presentation layer renders in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Current filter selection.
    pub filters: FilterState,
    /// Whether the "clear filters" affordance applies.
    pub has_filters: bool,
    /// Human-readable selection, absent without filters.
    pub active_filters: Option<String>,
    /// Summary card values.
    pub stats: Arc<TaskStats>,
    /// Chart data.
    pub charts: Charts,
    /// Timeline bars, date-unfiltered while a range is being picked.
    pub timeline: Arc<Vec<TimelineDataPoint>>,
    /// Current table page.
    pub table: TablePage,
}

/// Dashboard state holder.
///
/// Filter changes go through [`Dashboard::dispatch`] so they are persisted to `S` and the
/// timeline brush sees them. Record changes go through the async collaborator methods.
#[derive(Debug)]
pub struct Dashboard<S> {
    store: RecordStore,
    filters: FilterState,
    engine: DerivationEngine,
    table: TableView,
    brush: TimelineBrush,
    storage: S,
}

impl<S: FilterStorage> Dashboard<S> {
    /// Dashboard whose initial filters are read from `storage`.
    #[must_use]
    pub fn new(storage: S, page_size: usize) -> Self {
        let filters = load_filters(&storage);
        debug!(has_filters = filters.has_filters(), "restored filter state");
        Self {
            store: RecordStore::new(),
            brush: TimelineBrush::new(filters.date_range()),
            filters,
            engine: DerivationEngine::new(),
            table: TableView::new(page_size),
            storage,
        }
    }

    /// Dashboard configured from `config`.
    #[must_use]
    pub fn from_config(storage: S, config: &DashboardConfig) -> Self {
        Self::new(storage, config.page_size)
    }

    /// Record store.
    #[must_use]
    pub const fn records(&self) -> &RecordStore {
        &self.store
    }

    /// Current filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Derivation engine, for callers that want individual nodes.
    #[must_use]
    pub const fn engine(&self) -> &DerivationEngine {
        &self.engine
    }

    /// Table controller.
    #[must_use]
    pub const fn table(&self) -> &TableView {
        &self.table
    }

    /// Mutable table controller for sort, search, and paging.
    pub const fn table_mut(&mut self) -> &mut TableView {
        &mut self.table
    }

    /// Timeline brush.
    #[must_use]
    pub const fn brush(&self) -> &TimelineBrush {
        &self.brush
    }

    /// Loading, failed, or ready.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.store.load_state()
    }

    /// Fetch every record once and install it, or record the failure.
    pub async fn load(&mut self, api: &impl TaskApi) -> LoadState {
        self.store.set_loading(true);
        match api.get_tasks().await {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded tasks");
                self.store.replace_all(tasks);
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                self.store.set_error(Some(err.to_string()));
            }
        }
        self.store.load_state()
    }

    /// Apply a filter operation, then persist the result.
    ///
    /// Persistence failures are logged and otherwise ignored.
    pub fn dispatch(&mut self, action: FilterAction) {
        debug!(?action, "filter action");
        self.filters.apply(action);
        self.brush.sync(&self.filters.date_range());
        if let Err(err) = save_filters(&self.storage, &self.filters) {
            warn!(error = %err, "failed to persist filter state");
        }
    }

    /// Commit the range a preset selects relative to `today`.
    pub fn apply_preset(&mut self, preset: DateRangePreset, today: Date) {
        self.dispatch(FilterAction::SetDateRange(preset.range(today)));
    }

    /// Forward a timeline bar click; a completed selection is dispatched.
    pub fn click_timeline(&mut self, date: Date) {
        if let Some(range) = self.brush.click(date) {
            self.dispatch(FilterAction::SetDateRange(range));
        }
    }

    /// Create a record through `api` and append it locally.
    ///
    /// # Errors
    /// Returns the collaborator's error; the store is left untouched.
    pub async fn create_task(&mut self, api: &impl TaskApi, draft: TaskDraft) -> Result<Task, ApiError> {
        let task = api.create_task(draft).await?;
        self.store.insert(task.clone());
        Ok(task)
    }

    /// Update a record through `api` and mirror the result locally.
    ///
    /// # Errors
    /// Returns the collaborator's error; the store is left untouched.
    pub async fn update_task(
        &mut self,
        api: &impl TaskApi,
        id: &TaskId,
        changes: TaskChanges,
    ) -> Result<Option<Task>, ApiError> {
        let updated = api.update_task(id, changes).await?;
        if let Some(task) = &updated {
            self.store.replace(task.clone());
        }
        Ok(updated)
    }

    /// Delete a record through `api` and drop it locally.
    ///
    /// # Errors
    /// Returns the collaborator's error; the store is left untouched.
    pub async fn delete_task(&mut self, api: &impl TaskApi, id: &TaskId) -> Result<bool, ApiError> {
        let removed = api.delete_task(id).await?;
        if removed {
            self.store.remove(id);
        }
        Ok(removed)
    }

    const fn tasks(&self) -> &TaskList {
        self.store.shared_tasks()
    }

    /// Records passing every filter.
    #[must_use]
    pub fn filtered_tasks(&self) -> TaskList {
        self.engine.filtered_tasks(self.tasks(), &self.filters)
    }

    /// Summary statistics.
    #[must_use]
    pub fn task_stats(&self) -> Arc<TaskStats> {
        self.engine.task_stats(self.tasks(), &self.filters)
    }

    /// Status and category charts.
    #[must_use]
    pub fn charts(&self) -> Charts {
        Charts {
            status: self.engine.status_distribution(self.tasks(), &self.filters),
            category: self.engine.category_distribution(self.tasks(), &self.filters),
        }
    }

    /// Timeline bars for the current brush state.
    #[must_use]
    pub fn timeline(&self) -> Arc<Vec<TimelineDataPoint>> {
        if self.brush.uses_unfiltered_data() {
            self.engine.timeline_data_unfiltered(self.tasks(), &self.filters)
        } else {
            self.engine.timeline_data(self.tasks(), &self.filters)
        }
    }

    /// Current table page over the filtered records.
    #[must_use]
    pub fn table_page(&self) -> TablePage {
        self.table.page(&self.filtered_tasks())
    }

    /// Everything at once.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView {
            filters: self.filters.clone(),
            has_filters: self.filters.has_filters(),
            active_filters: describe_filters(&self.filters),
            stats: self.task_stats(),
            charts: self.charts(),
            timeline: self.timeline(),
            table: self.table_page(),
        }
    }
}

/// Render the selection as grouped chips, e.g.
/// `(Status: todo OR Status: done) AND (Start: Sep 01, 2025)`.
///
/// Returns `None` when [`FilterState::has_filters`] is false; the search query is not
/// shown.
#[must_use]
pub fn describe_filters(filters: &FilterState) -> Option<String> {
    if !filters.has_filters() {
        return None;
    }
    let chip_date = format_description!("[month repr:short] [day], [year]");
    let mut groups = Vec::new();
    if !filters.selected_statuses().is_empty() {
        let chips: Vec<String> = filters
            .selected_statuses()
            .iter()
            .map(|status| format!("Status: {status}"))
            .collect();
        groups.push(format!("({})", chips.join(" OR ")));
    }
    if !filters.selected_categories().is_empty() {
        let chips: Vec<String> = filters
            .selected_categories()
            .iter()
            .map(|category| format!("Category: {category}"))
            .collect();
        groups.push(format!("({})", chips.join(" OR ")));
    }
    let range = filters.date_range();
    if range.is_bounded() {
        let mut chips = Vec::new();
        for (label, bound) in [("Start", range.start), ("End", range.end)] {
            if let Some(date) = bound {
                let shown = date.format(chip_date).unwrap_or_else(|_| date.to_string());
                chips.push(format!("{label}: {shown}"));
            }
        }
        groups.push(format!("({})", chips.join(" AND ")));
    }
    Some(groups.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryTaskApi;
    use crate::persistence::{FILTER_STORAGE_KEY, MemoryStorage};
    use taskboard_core::{Category, DateRange, Status};
    use time::macros::date;

    struct OfflineApi;

    impl TaskApi for OfflineApi {
        async fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
            Err(ApiError::Unavailable("connection refused".into()))
        }

        async fn get_task(&self, _id: &TaskId) -> Result<Option<Task>, ApiError> {
            Err(ApiError::Unavailable("connection refused".into()))
        }

        async fn create_task(&self, _draft: TaskDraft) -> Result<Task, ApiError> {
            Err(ApiError::Unavailable("connection refused".into()))
        }

        async fn update_task(&self, _id: &TaskId, _changes: TaskChanges) -> Result<Option<Task>, ApiError> {
            Err(ApiError::Unavailable("connection refused".into()))
        }

        async fn delete_task(&self, _id: &TaskId) -> Result<bool, ApiError> {
            Err(ApiError::Unavailable("connection refused".into()))
        }
    }

    fn seed() -> Vec<Task> {
        let rows = [
            ("Frontend Task", Category::A, Status::Todo, date!(2025 - 09 - 01), 500.0),
            ("Backend Task", Category::A, Status::InProgress, date!(2025 - 09 - 02), 750.0),
            ("Design Task", Category::C, Status::Done, date!(2025 - 09 - 01), 300.0),
            ("Testing Task", Category::D, Status::Blocked, date!(2025 - 09 - 03), 400.0),
        ];
        rows.into_iter()
            .enumerate()
            .map(|(index, (title, category, status, date, amount))| Task {
                id: TaskId::sequential(index + 1),
                title: title.into(),
                category,
                status,
                date,
                amount,
            })
            .collect()
    }

    #[tokio::test]
    async fn load_installs_records() {
        let api = MemoryTaskApi::new(seed());
        let mut dashboard = Dashboard::new(MemoryStorage::new(), 10);
        assert_eq!(dashboard.load(&api).await, LoadState::Ready);
        assert_eq!(dashboard.records().tasks().len(), 4);
        assert_eq!(dashboard.task_stats().total, 4);
    }

    #[tokio::test]
    async fn load_failure_is_reported_without_records() {
        let mut dashboard = Dashboard::new(MemoryStorage::new(), 10);
        let state = dashboard.load(&OfflineApi).await;
        assert_eq!(
            state,
            LoadState::Failed("task service unavailable: connection refused".into())
        );
        assert!(dashboard.records().tasks().is_empty());
        assert!(!dashboard.records().is_loading());
    }

    #[test]
    fn dispatch_persists_every_action() {
        let storage = MemoryStorage::new();
        let mut dashboard = Dashboard::new(&storage, 10);
        dashboard.dispatch(FilterAction::ToggleStatus(Status::Done));

        let restored = Dashboard::new(&storage, 10);
        assert_eq!(restored.filters().selected_statuses(), [Status::Done]);

        dashboard.dispatch(FilterAction::ClearFilters);
        let cleared = Dashboard::new(&storage, 10);
        assert!(cleared.filters().is_empty());
    }

    #[test]
    fn malformed_persisted_state_starts_empty() {
        let storage = MemoryStorage::with_entry(FILTER_STORAGE_KEY, "\"oops\"");
        let dashboard = Dashboard::new(storage, 10);
        assert!(dashboard.filters().is_empty());
    }

    #[tokio::test]
    async fn crud_mirrors_into_the_store() {
        let api = MemoryTaskApi::new(seed());
        let mut dashboard = Dashboard::new(MemoryStorage::new(), 10);
        dashboard.load(&api).await;

        let created = dashboard
            .create_task(
                &api,
                TaskDraft {
                    title: "Release Task".into(),
                    category: Category::B,
                    status: Status::Todo,
                    date: date!(2025 - 09 - 04),
                    amount: 50.0,
                },
            )
            .await
            .unwrap_or_else(|err| panic!("create: {err}"));
        assert_eq!(created.id.as_str(), "task-5");
        assert_eq!(dashboard.records().tasks().len(), 5);

        let changes = TaskChanges {
            status: Some(Status::Done),
            ..TaskChanges::default()
        };
        let updated = dashboard
            .update_task(&api, &created.id, changes)
            .await
            .unwrap_or_else(|err| panic!("update: {err}"));
        assert!(updated.is_some());
        assert_eq!(
            dashboard.records().get(&created.id).map(|task| task.status.clone()),
            Some(Status::Done)
        );

        let missing = TaskId::new("task-404");
        let not_found = dashboard.update_task(&api, &missing, TaskChanges::default()).await;
        assert!(matches!(not_found, Ok(None)));
        assert!(matches!(dashboard.delete_task(&api, &missing).await, Ok(false)));

        assert!(matches!(dashboard.delete_task(&api, &created.id).await, Ok(true)));
        assert_eq!(dashboard.records().tasks().len(), 4);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_the_store_untouched() {
        let mut dashboard = Dashboard::new(MemoryStorage::new(), 10);
        dashboard.load(&MemoryTaskApi::new(seed())).await;
        let before = Arc::clone(dashboard.records().shared_tasks());

        let result = dashboard.delete_task(&OfflineApi, &TaskId::sequential(1)).await;
        assert!(result.is_err());
        assert!(Arc::ptr_eq(&before, dashboard.records().shared_tasks()));
    }

    #[tokio::test]
    async fn timeline_switches_source_while_selecting() {
        let mut dashboard = Dashboard::new(MemoryStorage::new(), 10);
        dashboard.load(&MemoryTaskApi::new(seed())).await;

        dashboard.click_timeline(date!(2025 - 09 - 02));
        assert_eq!(dashboard.filters().date_range(), DateRange::UNBOUNDED);
        dashboard.click_timeline(date!(2025 - 09 - 02));
        assert_eq!(
            dashboard.filters().date_range(),
            DateRange::between(date!(2025 - 09 - 02), date!(2025 - 09 - 02))
        );
        assert_eq!(dashboard.timeline().len(), 1);

        dashboard.click_timeline(date!(2025 - 09 - 01));
        assert!(dashboard.brush().uses_unfiltered_data());
        assert_eq!(dashboard.timeline().len(), 3);

        dashboard.apply_preset(DateRangePreset::AllTime, date!(2025 - 09 - 30));
        assert!(!dashboard.brush().uses_unfiltered_data());
    }

    #[tokio::test]
    async fn view_combines_every_derivation() {
        let mut dashboard = Dashboard::new(MemoryStorage::new(), 2);
        dashboard.load(&MemoryTaskApi::new(seed())).await;
        dashboard.dispatch(FilterAction::ToggleCategory(Category::A));

        let view = dashboard.view();
        assert!(view.has_filters);
        assert_eq!(view.active_filters.as_deref(), Some("(Category: A)"));
        assert_eq!(view.stats.total, 2);
        assert_eq!(view.charts.category.len(), 3);
        assert_eq!(view.table.rows.len(), 2);
        assert_eq!(view.table.total_pages, 1);

        let json = serde_json::to_value(&view).unwrap_or_else(|err| panic!("json: {err}"));
        assert_eq!(json["stats"]["totalAmount"], 1250.0);
        assert_eq!(json["filters"]["selectedCategories"], serde_json::json!(["A"]));
    }

    #[test]
    fn describe_filters_groups_chips() {
        assert_eq!(describe_filters(&FilterState::new()), None);

        let mut search_only = FilterState::new();
        search_only.set_search_query("deploy");
        assert_eq!(describe_filters(&search_only), None);

        let filters = FilterState::from_parts(
            vec![Status::Todo, Status::Done],
            vec![Category::B],
            DateRange::between(date!(2025 - 09 - 01), date!(2025 - 09 - 03)),
            "",
        );
        assert_eq!(
            describe_filters(&filters).as_deref(),
            Some(
                "(Status: todo OR Status: done) AND (Category: B) AND (Start: Sep 01, 2025 AND End: Sep 03, 2025)"
            )
        );
    }
}
