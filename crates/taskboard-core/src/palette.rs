use crate::task::{Category, Status};

/// Colour used for values outside the fixed palette.
pub const NEUTRAL: &str = "#6b7280";

/// Chart colour for a status bucket.
#[must_use]
pub const fn status_color(status: &Status) -> &'static str {
    match status {
        Status::Todo => "#3b82f6",
        Status::InProgress => "#f59e0b",
        Status::Done => "#10b981",
        Status::Blocked => "#ef4444",
        Status::Unknown(_) => NEUTRAL,
    }
}

/// Chart colour for a category bucket.
#[must_use]
pub const fn category_color(category: &Category) -> &'static str {
    match category {
        Category::A => "#8b5cf6",
        Category::B => "#06b6d4",
        Category::C => "#ec4899",
        Category::D => "#84cc16",
        Category::Unknown(_) => NEUTRAL,
    }
}

/// Timeline bar colours for the drag-select interaction.
pub mod timeline {
    /// Bar where a pending selection starts.
    pub const SELECTION_START: &str = "#1d4ed8";
    /// Bar after the pending start; clicking it commits a range.
    pub const SELECTABLE: &str = "#60a5fa";
    /// Bar before the pending start; clicks are ignored.
    pub const UNSELECTABLE: &str = "#d1d5db";
    /// Bar when no selection is pending.
    pub const DEFAULT: &str = "#9333ea";
}
