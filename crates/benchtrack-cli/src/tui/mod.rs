//! Terminal user interface for benchtrack.
//!
//! - [`sheet::run_sheet_tui`]: the board-by-board tracking sheet.

pub mod sheet;
