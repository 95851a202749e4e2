//! Tracking table data model.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{ResolveError, Schema, Status};

/// One of the two optimization configurations tracked per benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Small,
    Fast,
}

impl Slot {
    pub const ALL: [Self; 2] = [Self::Small, Self::Fast];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" | "s" => Ok(Self::Small),
            "fast" | "f" => Ok(Self::Fast),
            _ => Err(ResolveError::InvalidValue {
                kind: "slot",
                value: s.to_string(),
            }),
        }
    }
}

/// Tracked state of one (board, benchmark) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub small: Status,
    pub fast: Status,
    pub notes: String,
}

impl Cell {
    #[must_use]
    pub const fn get(&self, slot: Slot) -> Status {
        match slot {
            Slot::Small => self.small,
            Slot::Fast => self.fast,
        }
    }

    pub const fn set(&mut self, slot: Slot, status: Status) {
        match slot {
            Slot::Small => self.small = status,
            Slot::Fast => self.fast = status,
        }
    }

    /// Both slot statuses, small first.
    #[must_use]
    pub const fn statuses(&self) -> [Status; 2] {
        [self.small, self.fast]
    }
}

/// Cells of one board, keyed by benchmark key.
pub type BoardCells = BTreeMap<String, Cell>;

/// Board -> benchmark key -> cell.
///
/// Serializes transparently as
/// `{ board: { key: { small, fast, notes } } }`. Map order is storage order
/// only; display order always comes from the [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingTable {
    boards: BTreeMap<String, BoardCells>,
}

impl TrackingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn board(&self, board: &str) -> Option<&BoardCells> {
        self.boards.get(board)
    }

    pub(crate) fn board_mut(&mut self, board: &str) -> Option<&mut BoardCells> {
        self.boards.get_mut(board)
    }

    #[must_use]
    pub fn cell(&self, board: &str, key: &str) -> Option<&Cell> {
        self.boards.get(board)?.get(key)
    }

    pub fn cell_mut(&mut self, board: &str, key: &str) -> Option<&mut Cell> {
        self.boards.get_mut(board)?.get_mut(key)
    }

    /// Insert or replace a cell, creating the board entry on demand.
    pub fn insert(&mut self, board: impl Into<String>, key: impl Into<String>, cell: Cell) {
        self.boards
            .entry(board.into())
            .or_default()
            .insert(key.into(), cell);
    }

    /// Insert or replace a whole board.
    pub fn insert_board(&mut self, board: impl Into<String>, cells: BoardCells) {
        self.boards.insert(board.into(), cells);
    }

    /// Board names present in the table, in map order.
    pub fn board_names(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }

    /// Every `(board, key, cell)` triple, in map order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &Cell)> {
        self.boards.iter().flat_map(|(board, cells)| {
            cells
                .iter()
                .map(move |(key, cell)| (board.as_str(), key.as_str(), cell))
        })
    }

    /// Number of cells across all boards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The set of `(board, key)` pairs present.
    #[must_use]
    pub fn pairs(&self) -> BTreeSet<(String, String)> {
        self.cells()
            .map(|(board, key, _)| (board.to_string(), key.to_string()))
            .collect()
    }

    /// True when the table holds exactly the cross-product of the schema's
    /// boards and benchmark keys.
    #[must_use]
    pub fn is_complete_for(&self, schema: &Schema) -> bool {
        if self.boards.len() != schema.boards().len() || self.len() != schema.cell_count() {
            return false;
        }
        schema.boards().iter().all(|board| {
            self.boards
                .get(board)
                .is_some_and(|cells| schema.keys().all(|key| cells.contains_key(key)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BenchmarkCategory;

    #[test]
    fn slot_parses_and_displays() {
        assert_eq!("small".parse::<Slot>(), Ok(Slot::Small));
        assert_eq!("FAST".parse::<Slot>(), Ok(Slot::Fast));
        assert_eq!("f".parse::<Slot>(), Ok(Slot::Fast));
        assert!("medium".parse::<Slot>().is_err());
        assert_eq!(Slot::Small.to_string(), "small");
    }

    #[test]
    fn cell_get_and_set_are_independent() {
        let mut cell = Cell::default();
        cell.set(Slot::Fast, Status::UnableToRun);
        assert_eq!(cell.get(Slot::Small), Status::NotStarted);
        assert_eq!(cell.get(Slot::Fast), Status::UnableToRun);
        assert_eq!(cell.statuses(), [Status::NotStarted, Status::UnableToRun]);
    }

    #[test]
    fn cell_wire_shape() {
        let cell = Cell {
            small: Status::Collected,
            fast: Status::NotStarted,
            notes: "flaky on USB power".to_string(),
        };
        let value = serde_json::to_value(&cell).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "small": "Collected",
                "fast": "Not Started",
                "notes": "flaky on USB power"
            })
        );
    }

    #[test]
    fn table_serializes_transparently() {
        let mut table = TrackingTable::new();
        table.insert("A", "X - Y", Cell::default());
        let json = serde_json::to_string(&table).expect("serialize");
        assert_eq!(
            json,
            r#"{"A":{"X - Y":{"small":"Not Started","fast":"Not Started","notes":""}}}"#
        );
        let back: TrackingTable = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, table);
    }

    #[test]
    fn completeness_requires_exact_cross_product() {
        let schema =
            Schema::new(["A", "B"], vec![BenchmarkCategory::new("X", ["Y", "Z"])]).expect("schema");

        let mut table = TrackingTable::new();
        for board in ["A", "B"] {
            for key in ["X - Y", "X - Z"] {
                table.insert(board, key, Cell::default());
            }
        }
        assert!(table.is_complete_for(&schema));
        assert_eq!(table.len(), 4);

        let mut extra = table.clone();
        extra.insert("C", "X - Y", Cell::default());
        assert!(!extra.is_complete_for(&schema));

        let mut wrong_key = TrackingTable::new();
        for board in ["A", "B"] {
            for key in ["X - Y", "X - W"] {
                wrong_key.insert(board, key, Cell::default());
            }
        }
        assert!(!wrong_key.is_complete_for(&schema));
    }
}
