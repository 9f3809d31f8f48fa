use crate::task::Task;

/// Case-insensitive substring matcher for task titles.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Build a matcher for `query`. Returns `None` for blank inputs.
    ///
    /// Surrounding whitespace only matters for the blank check; a non-blank query is
    /// matched verbatim (lowercased), spaces included.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            return None;
        }
        Some(Self {
            needle: query.to_lowercase(),
        })
    }

    /// Determine whether the task title contains the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_text(&task.title)
    }

    /// Determine whether arbitrary text contains the query.
    #[must_use]
    pub fn matches_text(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}
