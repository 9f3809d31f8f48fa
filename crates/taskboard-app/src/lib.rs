//! Application layer for taskboard.
//!
//! This crate owns the record store, the memoized derivation engine, the table and
//! timeline controllers, filter persistence, the data-access collaborator, and the
//! [`Dashboard`] that wires them together for a presentation layer.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod memo;
pub mod persistence;
pub mod sample;
pub mod store;
pub mod table;
pub mod timeline;

// Re-exports for convenience
pub use api::{ApiError, JsonFileTaskApi, MemoryTaskApi, TaskApi};
pub use config::DashboardConfig;
pub use dashboard::{Charts, Dashboard, DashboardView, describe_filters};
pub use engine::{
    ChartDataPoint, DerivationEngine, StatusBreakdown, TaskList, TaskStats, TimelineDataPoint,
};
pub use memo::{Identity, Memo};
pub use persistence::{
    FILTER_STORAGE_KEY, FileStorage, FilterStorage, MemoryStorage, StorageError, load_filters,
    save_filters,
};
pub use sample::sample_tasks;
pub use store::{LoadState, RecordStore};
pub use table::{
    DEFAULT_PAGE_SIZE, SortDirection, SortField, SortOrder, TablePage, TableView,
    UnknownSortFieldError,
};
pub use timeline::{BrushState, TimelineBrush};
