//! The store: single owner of the current tracking table.
//!
//! Every successful mutation persists the whole table. Persistence failures
//! are reported as [`SaveOutcome::Failed`] and never undo the mutation: the
//! in-memory table stays authoritative for the rest of the session.

use std::cell::OnceCell;

use tracing::{debug, info, warn};

use crate::aggregate::{Summary, summarize};
use crate::error::{ParseError, TrackError};
use crate::matrix::build;
use crate::model::{Cell, Slot, TrackingTable};
use crate::reconcile::{MergeReport, merge_bytes};
use crate::schema::{Schema, Status};
use crate::storage::{Persistence, StorageError};

/// Result of persisting after a mutation.
#[must_use]
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    /// The mutation was applied in memory but could not be persisted.
    Failed(StorageError),
}

impl SaveOutcome {
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// The persistence failure, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<&StorageError> {
        match self {
            Self::Saved => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// How the store's initial table was obtained.
#[derive(Debug)]
pub enum LoadReport {
    /// Nothing was persisted yet; the table is fresh.
    Fresh,
    /// The persisted snapshot was reconciled into the current schema.
    Restored(MergeReport),
    /// The persisted snapshot was not JSON. The table is fresh and the bad
    /// snapshot was moved aside when the backend supports it.
    Recovered {
        error: ParseError,
        quarantined: Option<String>,
    },
}

pub struct Store<P: Persistence> {
    schema: Schema,
    table: TrackingTable,
    storage: P,
    summary: OnceCell<Summary>,
}

impl<P: Persistence> Store<P> {
    /// Load the persisted snapshot through the reconciler, or start fresh.
    ///
    /// A snapshot that is not JSON does not fail the open; see
    /// [`LoadReport::Recovered`].
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Storage`] when the snapshot exists but cannot be
    /// read, or cannot be quarantined after failing to parse.
    pub fn open(schema: Schema, mut storage: P) -> Result<(Self, LoadReport), TrackError> {
        let (table, report) = match storage.load()? {
            None => {
                debug!(location = %storage.location(), "no persisted snapshot; starting fresh");
                (build(&schema), LoadReport::Fresh)
            }
            Some(bytes) => match merge_bytes(&schema, &bytes) {
                Ok((table, merge)) => {
                    debug!(
                        restored = merge.restored,
                        defaulted = merge.defaulted,
                        dropped_boards = merge.dropped_boards.len(),
                        dropped_keys = merge.dropped_keys.len(),
                        "reconciled persisted snapshot"
                    );
                    (table, LoadReport::Restored(merge))
                }
                Err(error) => {
                    warn!(location = %storage.location(), %error, "persisted snapshot is malformed");
                    let quarantined = storage.quarantine()?;
                    (build(&schema), LoadReport::Recovered { error, quarantined })
                }
            },
        };

        Ok((Self::with_table(schema, table, storage), report))
    }

    /// Wrap an existing table without loading or saving anything.
    pub fn with_table(schema: Schema, table: TrackingTable, storage: P) -> Self {
        Self {
            schema,
            table,
            storage,
            summary: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn table(&self) -> &TrackingTable {
        &self.table
    }

    #[must_use]
    pub const fn storage(&self) -> &P {
        &self.storage
    }

    pub const fn storage_mut(&mut self) -> &mut P {
        &mut self.storage
    }

    /// Look up a cell.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Lookup`] when the board or key is not in the table.
    pub fn cell(&self, board: &str, key: &str) -> Result<&Cell, TrackError> {
        self.table
            .cell(board, key)
            .ok_or_else(|| TrackError::lookup(board, key))
    }

    /// Summary of the current table, cached until the next mutation.
    pub fn summary(&self) -> Summary {
        *self.summary.get_or_init(|| summarize(&self.table))
    }

    /// Replace one slot of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Lookup`] when the board or key is not in the
    /// table; nothing is changed or persisted in that case.
    pub fn set_status(
        &mut self,
        board: &str,
        key: &str,
        slot: Slot,
        status: Status,
    ) -> Result<SaveOutcome, TrackError> {
        let cell = self
            .table
            .cell_mut(board, key)
            .ok_or_else(|| TrackError::lookup(board, key))?;
        cell.set(slot, status);
        debug!(board, key, %slot, %status, "status set");
        Ok(self.commit())
    }

    /// Advance one slot by the fixed cycle order and return the new status.
    ///
    /// # Errors
    ///
    /// Same as [`Store::set_status`].
    pub fn cycle_status(
        &mut self,
        board: &str,
        key: &str,
        slot: Slot,
    ) -> Result<(Status, SaveOutcome), TrackError> {
        let next = self.cell(board, key)?.get(slot).next();
        let outcome = self.set_status(board, key, slot, next)?;
        Ok((next, outcome))
    }

    /// Replace a cell's notes.
    ///
    /// # Errors
    ///
    /// Same as [`Store::set_status`].
    pub fn set_note(
        &mut self,
        board: &str,
        key: &str,
        text: impl Into<String>,
    ) -> Result<SaveOutcome, TrackError> {
        let cell = self
            .table
            .cell_mut(board, key)
            .ok_or_else(|| TrackError::lookup(board, key))?;
        cell.notes = text.into();
        debug!(board, key, "note set");
        Ok(self.commit())
    }

    /// Adopt a whole table, typically the result of an import merge.
    pub fn replace_all(&mut self, table: TrackingTable) -> SaveOutcome {
        self.table = table;
        info!(cells = self.table.len(), "tracking table replaced");
        self.commit()
    }

    fn commit(&mut self) -> SaveOutcome {
        self.summary = OnceCell::new();
        let result = serde_json::to_vec(&self.table)
            .map_err(StorageError::from)
            .and_then(|bytes| self.storage.save(&bytes));
        match result {
            Ok(()) => SaveOutcome::Saved,
            Err(err) => {
                warn!(location = %self.storage.location(), error = %err, "failed to persist tracking table");
                SaveOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BenchmarkCategory;
    use crate::storage::MemoryStorage;

    fn ab_schema() -> Schema {
        Schema::new(["A", "B"], vec![BenchmarkCategory::new("X", ["Y"])]).expect("schema")
    }

    fn fresh_store() -> Store<MemoryStorage> {
        let (store, report) = Store::open(ab_schema(), MemoryStorage::new()).expect("open");
        assert!(matches!(report, LoadReport::Fresh));
        store
    }

    #[test]
    fn open_without_snapshot_is_fresh_and_does_not_save() {
        let store = fresh_store();
        assert_eq!(store.table(), &build(&ab_schema()));
        assert_eq!(store.storage().saves(), 0);
    }

    #[test]
    fn cycle_persists_every_change() {
        let mut store = fresh_store();
        let (status, outcome) = store.cycle_status("A", "X - Y", Slot::Small).expect("cycle");
        assert_eq!(status, Status::Collected);
        assert!(outcome.is_saved());
        assert_eq!(store.storage().saves(), 1);

        let persisted: serde_json::Value =
            serde_json::from_slice(store.storage().data().expect("data")).expect("json");
        assert_eq!(persisted["A"]["X - Y"]["small"], "Collected");
        assert_eq!(persisted["B"]["X - Y"]["small"], "Not Started");
    }

    #[test]
    fn three_cycles_return_to_start() {
        let mut store = fresh_store();
        for start in Status::ALL {
            store
                .set_status("B", "X - Y", Slot::Fast, start)
                .expect("set");
            for _ in 0..3 {
                let _ = store.cycle_status("B", "X - Y", Slot::Fast).expect("cycle");
            }
            assert_eq!(store.cell("B", "X - Y").expect("cell").fast, start);
        }
    }

    #[test]
    fn lookup_errors_do_not_touch_state() {
        let mut store = fresh_store();
        let before = store.table().clone();

        let err = store
            .set_status("C", "X - Y", Slot::Small, Status::Collected)
            .unwrap_err();
        assert!(matches!(err, TrackError::Lookup { ref board, .. } if board == "C"));
        assert!(store.cycle_status("A", "X - Z", Slot::Fast).is_err());
        assert!(store.set_note("A", "nope", "x").is_err());

        assert_eq!(store.table(), &before);
        assert_eq!(store.storage().saves(), 0);
    }

    #[test]
    fn set_note_replaces_notes_only() {
        let mut store = fresh_store();
        store
            .set_status("A", "X - Y", Slot::Fast, Status::UnableToRun)
            .expect("set");
        let _ = store.set_note("A", "X - Y", "needs PSRAM").expect("note");
        let cell = store.cell("A", "X - Y").expect("cell");
        assert_eq!(cell.notes, "needs PSRAM");
        assert_eq!(cell.fast, Status::UnableToRun);
    }

    #[test]
    fn persistence_failure_is_non_fatal() {
        let mut store = fresh_store();
        store.storage_mut().set_fail_saves(true);

        let outcome = store
            .set_status("A", "X - Y", Slot::Small, Status::Collected)
            .expect("mutation still succeeds");
        assert!(outcome.warning().is_some());
        assert_eq!(store.cell("A", "X - Y").expect("cell").small, Status::Collected);
        assert_eq!(store.summary().collected, 1);
    }

    #[test]
    fn summary_cache_is_invalidated_on_mutation() {
        let mut store = fresh_store();
        assert_eq!(store.summary().not_started, 4);
        let _ = store
            .set_status("A", "X - Y", Slot::Small, Status::Collected)
            .expect("set");
        let summary = store.summary();
        assert_eq!(summary.not_started, 3);
        assert_eq!(summary.collected, 1);
        assert_eq!(summary.percent_complete, 25);
    }

    #[test]
    fn open_reconciles_persisted_snapshot() {
        let saved = br#"{
            "A": {"X - Y": {"small": "Collected", "fast": "Not Started", "notes": "hi"}},
            "Gone": {}
        }"#;
        let (store, report) =
            Store::open(ab_schema(), MemoryStorage::with_data(&saved[..])).expect("open");
        let LoadReport::Restored(merge) = report else {
            panic!("expected a restored load");
        };
        assert_eq!(merge.restored, 1);
        assert_eq!(merge.dropped_boards, vec!["Gone".to_string()]);
        assert_eq!(store.cell("A", "X - Y").expect("cell").notes, "hi");
        assert!(store.table().is_complete_for(store.schema()));
    }

    #[test]
    fn open_recovers_from_malformed_snapshot() {
        let (store, report) =
            Store::open(ab_schema(), MemoryStorage::with_data("{oops")).expect("open");
        assert!(matches!(
            report,
            LoadReport::Recovered { quarantined: Some(_), .. }
        ));
        assert_eq!(store.table(), &build(&ab_schema()));
        assert_eq!(store.storage().quarantined(), &[b"{oops".to_vec()]);
        assert!(store.storage().data().is_none());
    }

    #[test]
    fn open_keeps_valid_cells_when_one_label_is_off() {
        let saved = br#"{
            "A": {"X - Y": {"small": "Collected", "fast": "Not Started", "notes": ""}},
            "B": {"X - Y": {"small": "Colected", "fast": "Not Started", "notes": "typo"}}
        }"#;
        let (store, report) =
            Store::open(ab_schema(), MemoryStorage::with_data(&saved[..])).expect("open");
        let LoadReport::Restored(merge) = report else {
            panic!("a mislabeled status must not discard the sheet");
        };
        assert_eq!(merge.unreadable, vec!["B / X - Y [small]".to_string()]);
        assert_eq!(store.cell("A", "X - Y").expect("cell").small, Status::Collected);
        assert_eq!(store.cell("B", "X - Y").expect("cell").notes, "typo");
        assert_eq!(store.summary().collected, 1);
        assert!(store.storage().quarantined().is_empty());
    }

    #[test]
    fn replace_all_adopts_table_and_persists() {
        let mut store = fresh_store();
        let mut table = build(&ab_schema());
        table.cell_mut("B", "X - Y").expect("cell").small = Status::UnableToRun;

        assert!(store.replace_all(table.clone()).is_saved());
        assert_eq!(store.table(), &table);
        assert_eq!(store.summary().unable_to_run, 1);
    }
}
