//! Domain types, filter state, and record predicates for taskboard.

/// Calendar-date parsing and serde helpers.
pub mod date;
/// Filter selection state and its operations.
pub mod filter;
/// Identifier types.
pub mod id;
/// Display colours keyed by domain values.
pub mod palette;
/// Named record predicates used by the derivation engine.
pub mod predicate;
/// Task records and their enumerated fields.
pub mod task;
/// Case-insensitive title matching.
pub mod text_matcher;

pub use date::{DateParseError, format_date, parse_date};
pub use filter::{DateRange, DateRangePreset, FilterAction, FilterState, UnknownPresetError};
pub use id::TaskId;
pub use predicate::{Criteria, Dimension};
pub use task::{Category, Status, Task, TaskChanges, TaskDraft};
pub use text_matcher::TextMatcher;
