use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use taskboard_app::{
    Dashboard, DashboardConfig, FileStorage, JsonFileTaskApi, LoadState, SortDirection, SortOrder,
    describe_filters, sample_tasks,
};
use taskboard_core::{DateRange, DateRangePreset, FilterAction, FilterState, TaskChanges, TaskDraft, TaskId};
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::{Command, FilterCommand};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterReport<'a> {
    filters: &'a FilterState,
    has_filters: bool,
    active_filters: Option<String>,
    active_preset: Option<&'static str>,
}

impl<'a> FilterReport<'a> {
    fn new(filters: &'a FilterState, today: Date) -> Self {
        Self {
            filters,
            has_filters: filters.has_filters(),
            active_filters: describe_filters(filters),
            active_preset: DateRangePreset::matching(&filters.date_range(), today).map(DateRangePreset::name),
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

async fn load(dashboard: &mut Dashboard<FileStorage>, api: &JsonFileTaskApi) -> Result<()> {
    match dashboard.load(api).await {
        LoadState::Failed(message) => bail!("failed to load tasks: {message}"),
        LoadState::Loading | LoadState::Ready => Ok(()),
    }
}

pub async fn run(command: Command, config: &DashboardConfig, tasks_file: PathBuf) -> Result<()> {
    let api = JsonFileTaskApi::new(tasks_file);
    let storage = FileStorage::new(config.storage_dir());
    let mut dashboard = Dashboard::from_config(storage, config);

    match command {
        Command::Stats => {
            load(&mut dashboard, &api).await?;
            print_json(&dashboard.task_stats())
        }
        Command::Charts => {
            load(&mut dashboard, &api).await?;
            print_json(&dashboard.charts())
        }
        Command::Timeline { unfiltered } => {
            load(&mut dashboard, &api).await?;
            let points = if unfiltered {
                dashboard
                    .engine()
                    .timeline_data_unfiltered(dashboard.records().shared_tasks(), dashboard.filters())
            } else {
                dashboard.timeline()
            };
            print_json(&points)
        }
        Command::Table {
            page,
            sort,
            desc,
            search,
        } => {
            load(&mut dashboard, &api).await?;
            let filtered = dashboard.filtered_tasks();
            let table = dashboard.table_mut();
            if sort.is_some() || desc {
                let field = sort.unwrap_or(table.sort().field);
                let direction = if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                table.set_sort(SortOrder { field, direction });
            }
            if let Some(search) = search {
                table.set_search(&search);
            }
            table.set_page(&filtered, page);
            print_json(&dashboard.table_page())
        }
        Command::View => {
            load(&mut dashboard, &api).await?;
            print_json(&dashboard.view())
        }
        Command::Filter { action } => run_filter(&mut dashboard, action),
        Command::Add {
            title,
            category,
            status,
            date,
            amount,
        } => {
            let draft = TaskDraft {
                title,
                category,
                status,
                date,
                amount,
            };
            let task = dashboard.create_task(&api, draft).await?;
            info!(id = %task.id, "created task");
            print_json(&task)
        }
        Command::Update {
            id,
            title,
            category,
            status,
            date,
            amount,
        } => {
            let changes = TaskChanges {
                title,
                category,
                status,
                date,
                amount,
            };
            if changes.is_empty() {
                bail!("nothing to update: pass at least one field");
            }
            let id = TaskId::new(id);
            match dashboard.update_task(&api, &id, changes).await? {
                Some(task) => print_json(&task),
                None => bail!("task not found: {id}"),
            }
        }
        Command::Delete { id } => {
            let id = TaskId::new(id);
            if !dashboard.delete_task(&api, &id).await? {
                bail!("task not found: {id}");
            }
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Command::Seed { count, seed } => {
            api.reset(sample_tasks(count, today(), seed))
                .await
                .with_context(|| format!("failed to write {}", api.path().display()))?;
            info!(count, path = %api.path().display(), "seeded tasks");
            print_json(&serde_json::json!({ "seeded": count }))
        }
    }
}

fn run_filter(dashboard: &mut Dashboard<FileStorage>, command: FilterCommand) -> Result<()> {
    let today = today();
    let action = match command {
        FilterCommand::Show => None,
        FilterCommand::Clear => Some(FilterAction::ClearFilters),
        FilterCommand::Reset => Some(FilterAction::ResetFilters),
        FilterCommand::Status { value } => Some(FilterAction::ToggleStatus(value)),
        FilterCommand::Category { value } => Some(FilterAction::ToggleCategory(value)),
        FilterCommand::Search { text } => Some(FilterAction::SetSearchQuery(text)),
        FilterCommand::Range { start, end } => Some(FilterAction::SetDateRange(DateRange::new(start, end))),
        FilterCommand::Preset { name } => Some(FilterAction::SetDateRange(name.range(today))),
    };
    if let Some(action) = action {
        dashboard.dispatch(action);
    }
    print_json(&FilterReport::new(dashboard.filters(), today))
}
