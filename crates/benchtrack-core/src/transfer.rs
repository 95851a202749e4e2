//! Export and import of portable tracking snapshots.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use tracing::info;

use crate::error::ParseError;
use crate::model::TrackingTable;
use crate::reconcile::{MergeReport, merge_bytes};
use crate::schema::Schema;

pub const EXPORT_PREFIX: &str = "benchmark_tracking_data_";

/// A serialized table ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `benchmark_tracking_data_YYYY-MM-DD_HH-MM.json` in the timestamp's own zone.
#[must_use]
pub fn snapshot_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{EXPORT_PREFIX}{}.json", now.format("%Y-%m-%d_%H-%M"))
}

/// Serialize `table` as 2-space indented JSON with a timestamped filename.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialization fails, which a well-formed
/// table never does.
pub fn export_snapshot<Tz: TimeZone>(
    table: &TrackingTable,
    now: &DateTime<Tz>,
) -> Result<Snapshot, serde_json::Error>
where
    Tz::Offset: std::fmt::Display,
{
    Ok(Snapshot {
        filename: snapshot_filename(now),
        bytes: serde_json::to_vec_pretty(table)?,
    })
}

/// [`export_snapshot`] stamped with the local wall clock.
///
/// # Errors
///
/// Same as [`export_snapshot`].
pub fn export_snapshot_now(table: &TrackingTable) -> Result<Snapshot, serde_json::Error> {
    export_snapshot(table, &Local::now())
}

/// Parse and reconcile a snapshot against `schema`.
///
/// The returned table is ready for [`crate::store::Store::replace_all`].
///
/// # Errors
///
/// Returns [`ParseError`] only when `bytes` are not JSON; every JSON value
/// reconciles.
pub fn import_snapshot(
    schema: &Schema,
    bytes: &[u8],
) -> Result<(TrackingTable, MergeReport), ParseError> {
    merge_bytes(schema, bytes)
}

/// Write `snapshot` into `dir` under its own filename.
///
/// An existing file is never overwritten: a second export within the same
/// minute gets a `-2`, `-3`, ... suffix before `.json`.
///
/// # Errors
///
/// Returns the underlying I/O error when the directory or file cannot be
/// written.
pub fn write_snapshot(snapshot: &Snapshot, dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stem = snapshot
        .filename
        .strip_suffix(".json")
        .unwrap_or(&snapshot.filename);

    let mut attempt = 1u32;
    loop {
        let name = if attempt == 1 {
            snapshot.filename.clone()
        } else {
            format!("{stem}-{attempt}.json")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&snapshot.bytes)?;
                info!(path = %path.display(), bytes = snapshot.bytes.len(), "snapshot exported");
                return Ok(path);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::build;
    use crate::model::Slot;
    use crate::schema::{BenchmarkCategory, Status};
    use chrono::{FixedOffset, Utc};

    fn ab_schema() -> Schema {
        Schema::new(["A", "B"], vec![BenchmarkCategory::new("X", ["Y"])]).expect("schema")
    }

    #[test]
    fn filename_is_zero_padded_24_hour() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 59).single().expect("time");
        assert_eq!(
            snapshot_filename(&at),
            "benchmark_tracking_data_2024-03-07_09-05.json"
        );

        let evening = FixedOffset::east_opt(2 * 3600)
            .expect("offset")
            .with_ymd_and_hms(2024, 12, 31, 23, 59, 0)
            .single()
            .expect("time");
        assert_eq!(
            snapshot_filename(&evening),
            "benchmark_tracking_data_2024-12-31_23-59.json"
        );
    }

    #[test]
    fn export_is_pretty_printed() {
        let table = build(&ab_schema());
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().expect("time");
        let snapshot = export_snapshot(&table, &at).expect("export");

        let text = String::from_utf8(snapshot.bytes).expect("utf8");
        assert!(text.starts_with("{\n  \"A\": {\n    \"X - Y\": {"));
        assert!(text.contains("\"small\": \"Not Started\""));
    }

    #[test]
    fn export_then_import_is_identity() {
        let schema = ab_schema();
        let mut table = build(&schema);
        let cell = table.cell_mut("A", "X - Y").expect("cell");
        cell.set(Slot::Small, Status::Collected);
        cell.notes = "ok".to_string();

        let snapshot = export_snapshot_now(&table).expect("export");
        let (imported, report) = import_snapshot(&schema, &snapshot.bytes).expect("import");
        assert_eq!(imported, table);
        assert!(report.is_exact());
    }

    #[test]
    fn import_rejects_only_non_json() {
        assert!(import_snapshot(&ab_schema(), b"\x00\x01garbage").is_err());

        let (table, report) = import_snapshot(&ab_schema(), b"[1,2,3]").expect("JSON reconciles");
        assert_eq!(table, build(&ab_schema()));
        assert_eq!(report.restored, 0);
        assert_eq!(report.unreadable, vec!["top level (array)".to_string()]);
    }

    #[test]
    fn import_of_snapshot_without_notes_keeps_statuses() {
        let bytes = br#"{
            "A": {"X - Y": {"small": "Collected", "fast": "Not Started"}},
            "B": {"X - Y": {"small": "Unable to Run", "fast": "Collected", "notes": "keep"}}
        }"#;
        let (table, report) = import_snapshot(&ab_schema(), bytes).expect("import");
        let a = table.cell("A", "X - Y").expect("cell");
        assert_eq!(a.small, Status::Collected);
        assert_eq!(a.notes, "");
        assert_eq!(table.cell("B", "X - Y").expect("cell").notes, "keep");
        assert_eq!(report.restored, 2);
    }

    #[test]
    fn write_snapshot_lands_in_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = Snapshot {
            filename: "benchmark_tracking_data_2024-01-01_00-00.json".to_string(),
            bytes: b"{}".to_vec(),
        };
        let path = write_snapshot(&snapshot, &dir.path().join("out")).expect("write");
        assert_eq!(fs::read(&path).expect("read"), b"{}");
        assert!(path.ends_with("out/benchmark_tracking_data_2024-01-01_00-00.json"));
    }

    #[test]
    fn write_snapshot_never_overwrites_same_minute_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = Snapshot {
            filename: "benchmark_tracking_data_2024-01-01_00-00.json".to_string(),
            bytes: b"{\"first\":1}".to_vec(),
        };
        let second = Snapshot {
            bytes: b"{\"second\":2}".to_vec(),
            ..first.clone()
        };

        let a = write_snapshot(&first, dir.path()).expect("first");
        let b = write_snapshot(&second, dir.path()).expect("second");
        let c = write_snapshot(&second, dir.path()).expect("third");

        assert_ne!(a, b);
        assert!(b.ends_with("benchmark_tracking_data_2024-01-01_00-00-2.json"));
        assert!(c.ends_with("benchmark_tracking_data_2024-01-01_00-00-3.json"));
        assert_eq!(fs::read(&a).expect("read"), first.bytes);
        assert_eq!(fs::read(&b).expect("read"), second.bytes);
    }
}
