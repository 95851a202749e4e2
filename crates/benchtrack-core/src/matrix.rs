use crate::model::{BoardCells, Cell, TrackingTable};
use crate::schema::Schema;

/// Build a fresh table covering every (board, benchmark key) pair of the
/// schema, each cell at `Not Started` with an empty note.
#[must_use]
pub fn build(schema: &Schema) -> TrackingTable {
    let mut table = TrackingTable::new();
    for board in schema.boards() {
        table.insert_board(board.as_str(), build_board(schema));
    }
    table
}

/// A fresh set of cells for one board.
#[must_use]
pub fn build_board(schema: &Schema) -> BoardCells {
    schema
        .keys()
        .map(|key| (key.to_string(), Cell::default()))
        .collect()
}
