//! Reconciler: overlay a persisted table onto a fresh, schema-complete one.
//!
//! The merge is one-directional. The current schema decides which cells
//! exist; the saved table decides their values wherever a (board, key) pair
//! matches. Matched cells are replaced whole, never merged per field.
//! Entries the schema no longer knows are dropped, and schema entries the
//! saved table lacks keep their default cell.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ParseError;
use crate::matrix::build;
use crate::model::{Cell, Slot, TrackingTable};
use crate::schema::{Schema, Status};

/// What a merge kept, defaulted and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Cells taken from the saved table.
    pub restored: usize,
    /// Schema cells absent from the saved table, left at their default.
    pub defaulted: usize,
    /// Saved boards unknown to the schema.
    pub dropped_boards: Vec<String>,
    /// Saved `(board, key)` pairs on known boards with keys unknown to the schema.
    pub dropped_keys: Vec<(String, String)>,
    /// Known entries whose shape could not be read, or status fields that
    /// fell back to Not Started.
    pub unreadable: Vec<String>,
}

impl MergeReport {
    /// True when the saved table matched the schema exactly.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.defaulted == 0
            && self.dropped_boards.is_empty()
            && self.dropped_keys.is_empty()
            && self.unreadable.is_empty()
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read one status field. Missing or unrecognized values become Not Started.
fn read_status(
    fields: &Map<String, Value>,
    slot: Slot,
    location: &str,
    report: &mut MergeReport,
) -> Status {
    let raw = fields.get(slot.as_str());
    let parsed = raw
        .and_then(Value::as_str)
        .and_then(|label| Status::from_label(label).or_else(|| label.parse().ok()));
    parsed.unwrap_or_else(|| {
        debug!(location, %slot, value = ?raw, "unreadable status, using Not Started");
        report.unreadable.push(format!("{location} [{slot}]"));
        Status::NotStarted
    })
}

/// Merge an untyped saved snapshot into a fresh table for `schema`.
///
/// Never fails: any JSON value yields a schema-complete table. Values under
/// unknown boards or keys are never inspected. A top level, board or cell
/// that is not an object restores nothing and is listed in
/// [`MergeReport::unreadable`]. Inside a known cell, a missing `notes`
/// becomes `""` and a missing or unknown status becomes Not Started.
#[must_use]
pub fn merge(schema: &Schema, saved: &Value) -> (TrackingTable, MergeReport) {
    let mut table = build(schema);
    let mut report = MergeReport::default();

    let Value::Object(saved_boards) = saved else {
        debug!(found = json_kind(saved), "snapshot is not an object; nothing to restore");
        report
            .unreadable
            .push(format!("top level ({})", json_kind(saved)));
        report.defaulted = schema.cell_count();
        return (table, report);
    };

    for (board, saved_cells) in saved_boards {
        let Some(fresh_cells) = table.board_mut(board) else {
            debug!(board = %board, "dropping board unknown to the schema");
            report.dropped_boards.push(board.clone());
            continue;
        };

        let Value::Object(saved_cells) = saved_cells else {
            debug!(board = %board, found = json_kind(saved_cells), "board is not an object");
            report
                .unreadable
                .push(format!("{board} ({})", json_kind(saved_cells)));
            continue;
        };

        for (key, raw_cell) in saved_cells {
            let Some(fresh) = fresh_cells.get_mut(key) else {
                debug!(board = %board, key = %key, "dropping benchmark unknown to the schema");
                report.dropped_keys.push((board.clone(), key.clone()));
                continue;
            };

            let location = format!("{board} / {key}");
            let Value::Object(fields) = raw_cell else {
                debug!(location, found = json_kind(raw_cell), "cell is not an object");
                report
                    .unreadable
                    .push(format!("{location} ({})", json_kind(raw_cell)));
                continue;
            };

            *fresh = Cell {
                small: read_status(fields, Slot::Small, &location, &mut report),
                fast: read_status(fields, Slot::Fast, &location, &mut report),
                notes: fields
                    .get("notes")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            };
            report.restored += 1;
        }
    }

    report.defaulted = schema.cell_count() - report.restored;
    (table, report)
}

/// Parse snapshot bytes as JSON, then [`merge`].
///
/// # Errors
///
/// Returns [`ParseError::Json`] for bytes that are not JSON. Every JSON
/// value reconciles.
pub fn merge_bytes(schema: &Schema, bytes: &[u8]) -> Result<(TrackingTable, MergeReport), ParseError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(merge(schema, &value))
}
