//! Two boards, one single-variant benchmark: the smallest complete sheet.

use benchtrack_core::schema::BenchmarkCategory;
use benchtrack_core::storage::{FileStorage, MemoryStorage};
use benchtrack_core::transfer::{export_snapshot_now, import_snapshot};
use benchtrack_core::{Cell, LoadReport, Schema, Slot, Status, Store, TrackError};
use serde_json::json;

fn ab_schema() -> Schema {
    Schema::new(["A", "B"], vec![BenchmarkCategory::new("X", ["Y"])]).expect("schema")
}

#[test]
fn fresh_sheet_summary() {
    let (store, _) = Store::open(ab_schema(), MemoryStorage::new()).expect("open");
    let summary = store.summary();
    assert_eq!(summary.not_started, 4);
    assert_eq!(summary.collected, 0);
    assert_eq!(summary.unable_to_run, 0);
    assert_eq!(summary.percent_complete, 0);
}

#[test]
fn cycle_small_on_a_survives_export_and_import() {
    let (mut store, _) = Store::open(ab_schema(), MemoryStorage::new()).expect("open");
    let (status, outcome) = store.cycle_status("A", "X - Y", Slot::Small).expect("cycle");
    assert_eq!(status, Status::Collected);
    assert!(outcome.is_saved());

    let summary = store.summary();
    assert_eq!(summary.not_started, 3);
    assert_eq!(summary.collected, 1);
    assert_eq!(summary.percent_complete, 25);

    let snapshot = export_snapshot_now(store.table()).expect("export");
    let (mut other, _) = Store::open(ab_schema(), MemoryStorage::new()).expect("open");
    let (table, report) = import_snapshot(other.schema(), &snapshot.bytes).expect("import");
    assert!(report.is_exact());
    assert!(other.replace_all(table).is_saved());

    assert_eq!(
        other.cell("A", "X - Y").expect("cell"),
        &Cell {
            small: Status::Collected,
            fast: Status::NotStarted,
            notes: String::new(),
        }
    );
    assert_eq!(other.cell("B", "X - Y").expect("cell"), &Cell::default());
    assert_eq!(other.summary(), summary);
}

#[test]
fn import_with_unknown_board_and_key() {
    let (mut store, _) = Store::open(ab_schema(), MemoryStorage::new()).expect("open");
    let file = json!({
        "A": {
            "X - Y": { "small": "Unable to Run", "fast": "Collected", "notes": "n" },
            "X - Z": { "small": "Collected", "fast": "Collected", "notes": "" }
        },
        "C": {
            "X - Y": { "small": "Collected", "fast": "Collected", "notes": "" }
        }
    });
    let bytes = serde_json::to_vec(&file).expect("encode");

    let (table, report) = import_snapshot(store.schema(), &bytes).expect("import");
    assert!(store.replace_all(table).is_saved());

    let a = store.cell("A", "X - Y").expect("cell");
    assert_eq!(a.small, Status::UnableToRun);
    assert_eq!(a.fast, Status::Collected);
    assert_eq!(a.notes, "n");
    assert_eq!(store.cell("B", "X - Y").expect("cell").small, Status::NotStarted);

    assert!(matches!(store.cell("C", "X - Y"), Err(TrackError::Lookup { .. })));
    assert!(matches!(store.cell("A", "X - Z"), Err(TrackError::Lookup { .. })));
    assert_eq!(report.dropped_boards, vec!["C".to_string()]);
    assert_eq!(report.dropped_keys, vec![("A".to_string(), "X - Z".to_string())]);
    assert_eq!(store.summary().percent_complete, 50);
}

#[test]
fn garbage_import_changes_nothing() {
    let (mut store, _) = Store::open(ab_schema(), MemoryStorage::new()).expect("open");
    let _ = store.cycle_status("B", "X - Y", Slot::Fast).expect("cycle");
    let before = store.table().clone();
    let saves = store.storage().saves();

    let err = import_snapshot(store.schema(), b"definitely { not json").unwrap_err();
    let err = TrackError::from(err);
    assert_eq!(err.error_code().code(), "E3001");

    assert_eq!(store.table(), &before);
    assert_eq!(store.storage().saves(), saves);
}

#[test]
fn session_survives_reload_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tracking.json");

    {
        let (mut store, report) =
            Store::open(ab_schema(), FileStorage::new(&path)).expect("open");
        assert!(matches!(report, LoadReport::Fresh));
        let _ = store
            .set_status("A", "X - Y", Slot::Fast, Status::Collected)
            .expect("set");
        let _ = store.set_note("A", "X - Y", "run at 240MHz").expect("note");
    }

    let (store, report) = Store::open(ab_schema(), FileStorage::new(&path)).expect("reopen");
    assert!(matches!(report, LoadReport::Restored(ref merge) if merge.is_exact()));
    let cell = store.cell("A", "X - Y").expect("cell");
    assert_eq!(cell.fast, Status::Collected);
    assert_eq!(cell.notes, "run at 240MHz");

    let exported = export_snapshot_now(store.table()).expect("export");
    let (reimported, _) = import_snapshot(store.schema(), &exported.bytes).expect("import");
    assert_eq!(&reimported, store.table());
}

#[test]
fn schema_growth_keeps_existing_cells() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tracking.json");
    {
        let (mut store, _) = Store::open(ab_schema(), FileStorage::new(&path)).expect("open");
        let _ = store
            .set_status("B", "X - Y", Slot::Small, Status::UnableToRun)
            .expect("set");
    }

    let grown = Schema::new(
        ["A", "B", "C"],
        vec![BenchmarkCategory::new("X", ["Y", "Z"])],
    )
    .expect("schema");
    let (store, report) = Store::open(grown, FileStorage::new(&path)).expect("open");
    let LoadReport::Restored(merge) = report else {
        panic!("expected a restored load");
    };
    assert_eq!(merge.restored, 2);
    assert_eq!(merge.defaulted, 4);
    assert_eq!(store.cell("B", "X - Y").expect("cell").small, Status::UnableToRun);
    assert_eq!(store.cell("C", "X - Z").expect("cell").small, Status::NotStarted);
}
