//! Data-access collaborator: where task records come from and where edits go.

use std::io;
use std::path::{Path, PathBuf};

use taskboard_core::{Task, TaskChanges, TaskDraft, TaskId};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Transport-level failures. Unknown ids are not errors; see [`TaskApi`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backing file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Backing file does not hold a JSON array of tasks.
    #[error("failed to parse {path}: {source}")]
    Decode {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Tasks could not be encoded.
    #[error("failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),

    /// Backend refused or could not serve the request.
    #[error("task service unavailable: {0}")]
    Unavailable(String),
}

/// Async task source.
///
/// Point operations report an unknown id as `Ok(None)` or `Ok(false)` so callers can tell
/// "not found" apart from a failed request.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    /// Fetch every task.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be reached or decoded.
    async fn get_tasks(&self) -> Result<Vec<Task>, ApiError>;

    /// Fetch one task.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be reached or decoded.
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, ApiError>;

    /// Create a task; the backend assigns the id.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be reached or written.
    async fn create_task(&self, draft: TaskDraft) -> Result<Task, ApiError>;

    /// Apply `changes` to an existing task and return the result.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be reached or written.
    async fn update_task(&self, id: &TaskId, changes: TaskChanges) -> Result<Option<Task>, ApiError>;

    /// Remove a task. Returns whether it existed.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be reached or written.
    async fn delete_task(&self, id: &TaskId) -> Result<bool, ApiError>;
}

/// Ordered task list with a sequential id counter.
#[derive(Debug, Clone)]
struct TaskTable {
    tasks: Vec<Task>,
    next_id: usize,
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TaskTable {
    fn new(tasks: Vec<Task>) -> Self {
        let next_id = tasks.len() + 1;
        Self { tasks, next_id }
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }

    fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.iter().find(|task| task.id == *id).cloned()
    }

    fn allocate_id(&mut self) -> TaskId {
        loop {
            let id = TaskId::sequential(self.next_id);
            self.next_id += 1;
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    fn create(&mut self, draft: TaskDraft) -> Task {
        let id = self.allocate_id();
        let task = Task::from_draft(id, draft);
        self.tasks.push(task.clone());
        task
    }

    fn update(&mut self, id: &TaskId, changes: TaskChanges) -> Option<Task> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        task.apply_changes(changes);
        Some(task.clone())
    }

    fn delete(&mut self, id: &TaskId) -> bool {
        self.position(id).is_some_and(|index| {
            self.tasks.remove(index);
            true
        })
    }
}

/// In-memory task database.
#[derive(Debug, Default)]
pub struct MemoryTaskApi {
    table: Mutex<TaskTable>,
}

impl MemoryTaskApi {
    /// Database holding `tasks`; new ids continue from `task-<len + 1>`.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            table: Mutex::new(TaskTable::new(tasks)),
        }
    }

    /// Replace the contents and restart the id counter.
    pub async fn reset(&self, tasks: Vec<Task>) {
        *self.table.lock().await = TaskTable::new(tasks);
    }
}

impl TaskApi for MemoryTaskApi {
    async fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.table.lock().await.tasks.clone())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, ApiError> {
        Ok(self.table.lock().await.get(id))
    }

    async fn create_task(&self, draft: TaskDraft) -> Result<Task, ApiError> {
        Ok(self.table.lock().await.create(draft))
    }

    async fn update_task(&self, id: &TaskId, changes: TaskChanges) -> Result<Option<Task>, ApiError> {
        Ok(self.table.lock().await.update(id, changes))
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, ApiError> {
        Ok(self.table.lock().await.delete(id))
    }
}

/// Task database stored as a JSON array in a single file.
///
/// The file is read on first use and rewritten after every successful mutation. A
/// missing file is an empty database.
#[derive(Debug)]
pub struct JsonFileTaskApi {
    path: PathBuf,
    table: Mutex<Option<TaskTable>>,
}

impl JsonFileTaskApi {
    /// Database backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(None),
        }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `tasks` and restart the id counter.
    ///
    /// # Errors
    /// Returns an error when the file cannot be written.
    pub async fn reset(&self, tasks: Vec<Task>) -> Result<(), ApiError> {
        let table = TaskTable::new(tasks);
        self.write(&table).await?;
        *self.table.lock().await = Some(table);
        Ok(())
    }

    async fn read(&self) -> Result<TaskTable, ApiError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "task file missing; starting empty");
                return Ok(TaskTable::default());
            }
            Err(source) => {
                return Err(ApiError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let tasks: Vec<Task> = serde_json::from_str(&contents).map_err(|source| ApiError::Decode {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(TaskTable::new(tasks))
    }

    async fn write(&self, table: &TaskTable) -> Result<(), ApiError> {
        let encoded = serde_json::to_string_pretty(&table.tasks)?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| ApiError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        tokio::fs::write(&self.path, encoded).await.map_err(|source| ApiError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Run `op` against the loaded table, persisting when `op` reports a change.
    async fn with_table<T>(&self, op: impl FnOnce(&mut TaskTable) -> (T, bool)) -> Result<T, ApiError> {
        let mut guard = self.table.lock().await;
        let table = match guard.take() {
            Some(table) => table,
            None => self.read().await?,
        };
        let table = guard.insert(table);
        let (output, changed) = op(table);
        if changed && let Err(err) = self.write(table).await {
            // Drop the unsaved state so the next call rereads the file.
            *guard = None;
            return Err(err);
        }
        Ok(output)
    }
}

impl TaskApi for JsonFileTaskApi {
    async fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.with_table(|table| (table.tasks.clone(), false)).await
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, ApiError> {
        self.with_table(|table| (table.get(id), false)).await
    }

    async fn create_task(&self, draft: TaskDraft) -> Result<Task, ApiError> {
        self.with_table(|table| (table.create(draft), true)).await
    }

    async fn update_task(&self, id: &TaskId, changes: TaskChanges) -> Result<Option<Task>, ApiError> {
        self.with_table(|table| {
            let updated = table.update(id, changes);
            let changed = updated.is_some();
            (updated, changed)
        })
        .await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, ApiError> {
        self.with_table(|table| {
            let removed = table.delete(id);
            (removed, removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::{Category, Status};
    use tempfile::tempdir;
    use time::macros::date;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            category: Category::B,
            status: Status::Todo,
            date: date!(2025 - 09 - 10),
            amount: 120.0,
        }
    }

    fn seeded(count: usize) -> Vec<Task> {
        (1..=count)
            .map(|n| Task::from_draft(TaskId::sequential(n), draft(&format!("Seed {n}"))))
            .collect()
    }

    #[tokio::test]
    async fn memory_ids_continue_after_the_seed() {
        let api = MemoryTaskApi::new(seeded(3));
        let created = api
            .create_task(draft("New"))
            .await
            .unwrap_or_else(|err| panic!("create: {err}"));
        assert_eq!(created.id.as_str(), "task-4");
        assert_eq!(api.get_tasks().await.map(|tasks| tasks.len()).ok(), Some(4));
    }

    #[tokio::test]
    async fn memory_ids_skip_values_already_taken() {
        let mut tasks = seeded(2);
        tasks[0].id = TaskId::new("task-3");
        let api = MemoryTaskApi::new(tasks);
        let created = api
            .create_task(draft("New"))
            .await
            .unwrap_or_else(|err| panic!("create: {err}"));
        assert_eq!(created.id.as_str(), "task-4");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_errors() {
        let api = MemoryTaskApi::new(seeded(1));
        let missing = TaskId::new("task-99");
        assert!(matches!(api.get_task(&missing).await, Ok(None)));
        assert!(matches!(api.update_task(&missing, TaskChanges::default()).await, Ok(None)));
        assert!(matches!(api.delete_task(&missing).await, Ok(false)));
    }

    #[tokio::test]
    async fn update_merges_only_present_fields() {
        let api = MemoryTaskApi::new(seeded(1));
        let id = TaskId::sequential(1);
        let changes = TaskChanges {
            status: Some(Status::Done),
            ..TaskChanges::default()
        };
        let updated = api
            .update_task(&id, changes)
            .await
            .unwrap_or_else(|err| panic!("update: {err}"))
            .unwrap_or_else(|| panic!("task missing"));
        assert_eq!(updated.status, Status::Done);
        assert_eq!(updated.title, "Seed 1");
        assert_eq!(updated.id, id);
    }

    #[tokio::test]
    async fn reset_restarts_the_counter() {
        let api = MemoryTaskApi::new(seeded(5));
        api.reset(seeded(1)).await;
        let created = api
            .create_task(draft("After reset"))
            .await
            .unwrap_or_else(|err| panic!("create: {err}"));
        assert_eq!(created.id.as_str(), "task-2");
    }

    #[tokio::test]
    async fn file_api_persists_mutations() {
        let dir = tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let path = dir.path().join("data").join("tasks.json");

        let api = JsonFileTaskApi::new(&path);
        assert!(matches!(api.get_tasks().await, Ok(tasks) if tasks.is_empty()));
        let created = api
            .create_task(draft("Persisted"))
            .await
            .unwrap_or_else(|err| panic!("create: {err}"));
        assert_eq!(created.id.as_str(), "task-1");

        let reopened = JsonFileTaskApi::new(&path);
        let tasks = reopened.get_tasks().await.unwrap_or_else(|err| panic!("get: {err}"));
        assert_eq!(tasks, vec![created.clone()]);

        assert!(matches!(reopened.delete_task(&created.id).await, Ok(true)));
        let again = JsonFileTaskApi::new(&path);
        assert!(matches!(again.get_tasks().await, Ok(tasks) if tasks.is_empty()));
    }

    #[tokio::test]
    async fn file_api_reports_malformed_files() {
        let dir = tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap_or_else(|err| panic!("write: {err}"));

        let api = JsonFileTaskApi::new(&path);
        assert!(matches!(api.get_tasks().await, Err(ApiError::Decode { .. })));
    }
}
