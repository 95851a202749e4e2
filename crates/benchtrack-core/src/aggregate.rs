use serde::Serialize;

use crate::model::{Cell, TrackingTable};
use crate::schema::Status;

/// Per-status slot counts and completion percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub not_started: usize,
    pub collected: usize,
    pub unable_to_run: usize,
    pub percent_complete: usize,
}

impl Summary {
    /// Total counted slots (two per cell).
    #[must_use]
    pub const fn total(&self) -> usize {
        self.not_started + self.collected + self.unable_to_run
    }

    /// Slots that are Collected or Unable to Run.
    #[must_use]
    pub const fn resolved(&self) -> usize {
        self.collected + self.unable_to_run
    }

    #[must_use]
    pub const fn count(&self, status: Status) -> usize {
        match status {
            Status::NotStarted => self.not_started,
            Status::Collected => self.collected,
            Status::UnableToRun => self.unable_to_run,
        }
    }

    fn tally<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut summary = Self::default();
        for status in cells.flat_map(Cell::statuses) {
            match status {
                Status::NotStarted => summary.not_started += 1,
                Status::Collected => summary.collected += 1,
                Status::UnableToRun => summary.unable_to_run += 1,
            }
        }
        summary.percent_complete = percent(summary.resolved(), summary.total());
        summary
    }
}

/// `round(resolved / total * 100)` with halves rounded up, 0 for an empty
/// total. Integer arithmetic keeps `x.5` boundaries exact.
const fn percent(resolved: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (resolved * 200 + total) / (total * 2)
}

/// Count every `small` and `fast` slot of every cell.
#[must_use]
pub fn summarize(table: &TrackingTable) -> Summary {
    Summary::tally(table.cells().map(|(_, _, cell)| cell))
}

/// [`summarize`] restricted to one board. Unknown boards summarize as empty.
#[must_use]
pub fn summarize_board(table: &TrackingTable, board: &str) -> Summary {
    table
        .board(board)
        .map(|cells| Summary::tally(cells.values()))
        .unwrap_or_default()
}
