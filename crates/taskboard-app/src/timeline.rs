//! Two-click date-range selection on the timeline chart.

use taskboard_core::DateRange;
use taskboard_core::palette::timeline;
use time::Date;
use tracing::debug;

/// Selection progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushState {
    /// No selection pending; the chart shows the committed range.
    #[default]
    Idle,
    /// First bar clicked; waiting for an end date on or after it.
    StartSelected(Date),
}

/// Drag-select controller for the timeline.
///
/// The first click picks a start day, a second click on the same or a later day commits
/// the range, and clicks on earlier days are ignored. A change to the committed range
/// made elsewhere (a preset, a clear) abandons any pending selection; see
/// [`TimelineBrush::sync`].
#[derive(Debug, Clone, Default)]
pub struct TimelineBrush {
    state: BrushState,
    committed: DateRange,
}

impl TimelineBrush {
    /// Idle brush observing `committed`.
    #[must_use]
    pub const fn new(committed: DateRange) -> Self {
        Self {
            state: BrushState::Idle,
            committed,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BrushState {
        self.state
    }

    /// Handle a bar click. Returns the range to commit when the click completes one.
    pub fn click(&mut self, date: Date) -> Option<DateRange> {
        match self.state {
            BrushState::Idle => {
                self.state = BrushState::StartSelected(date);
                None
            }
            BrushState::StartSelected(start) if date >= start => {
                let range = DateRange::between(start, date);
                self.state = BrushState::Idle;
                self.committed = range;
                Some(range)
            }
            BrushState::StartSelected(start) => {
                debug!(%start, clicked = %date, "ignoring click before selection start");
                None
            }
        }
    }

    /// Abandon a pending selection.
    pub const fn cancel(&mut self) {
        self.state = BrushState::Idle;
    }

    /// Observe the committed range. A range different from the last one seen resets the
    /// brush to idle; returns true when that happened.
    pub fn sync(&mut self, committed: &DateRange) -> bool {
        if self.committed == *committed {
            return false;
        }
        self.committed = *committed;
        let was_selecting = self.uses_unfiltered_data();
        self.cancel();
        was_selecting
    }

    /// True while a start is selected, when the chart reads the date-unfiltered timeline.
    #[must_use]
    pub const fn uses_unfiltered_data(&self) -> bool {
        matches!(self.state, BrushState::StartSelected(_))
    }

    /// Fill colour for the bar on `date`.
    #[must_use]
    pub fn bar_color(&self, date: Date) -> &'static str {
        match self.state {
            BrushState::StartSelected(start) if date == start => timeline::SELECTION_START,
            BrushState::StartSelected(start) if date > start => timeline::SELECTABLE,
            BrushState::StartSelected(_) => timeline::UNSELECTABLE,
            BrushState::Idle => timeline::DEFAULT,
        }
    }
}
