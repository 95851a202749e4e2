pub mod boards;
pub mod completions;
pub mod cycle;
pub mod export;
pub mod import;
pub mod init;
pub mod note;
pub mod set;
pub mod sheet;
pub mod show;
pub mod summary;

use crate::output::render_warning;
use anyhow::{Context as _, Result};
use benchtrack_core::project::Project;
use benchtrack_core::storage::FileStorage;
use benchtrack_core::{LoadReport, SaveOutcome, Schema, Store, TrackError};
use std::path::Path;
use tracing::debug;

/// Locate the project at or above `start`.
pub fn open_project(start: &Path) -> Result<Project> {
    Ok(Project::discover(start)?)
}

/// Open the store, surfacing recovery from a malformed snapshot as a warning.
pub fn open_store(project: &Project) -> Result<Store<FileStorage>> {
    let (store, report) = project
        .open_store()
        .context("failed to load tracking data")?;
    match report {
        LoadReport::Fresh => debug!("no tracking data yet; using a fresh sheet"),
        LoadReport::Restored(merge) if !merge.unreadable.is_empty() => render_warning(&format!(
            "tracking data had unreadable entries, kept defaults for: {}",
            merge.unreadable.join(", ")
        )),
        LoadReport::Restored(merge) if !merge.is_exact() => debug!(
            dropped_boards = merge.dropped_boards.len(),
            dropped_keys = merge.dropped_keys.len(),
            defaulted = merge.defaulted,
            "tracking data reconciled with the current schema"
        ),
        LoadReport::Restored(_) => {}
        LoadReport::Recovered { error, quarantined } => {
            let moved = quarantined.map_or_else(String::new, |path| format!("; moved to {path}"));
            render_warning(&format!(
                "tracking data was unreadable ({error}){moved}. Starting from a fresh sheet."
            ));
        }
    }
    Ok(store)
}

/// Map user-supplied board and benchmark names onto schema names.
pub fn resolve_cell<'s>(schema: &'s Schema, board: &str, key: &str) -> Result<(&'s str, &'s str), TrackError> {
    Ok((schema.resolve_board(board)?, schema.resolve_key(key)?))
}

/// Warn when a mutation could not be persisted. Returns whether it was saved.
pub fn report_save(outcome: &SaveOutcome) -> bool {
    match outcome.warning() {
        None => true,
        Some(err) => {
            render_warning(&format!("change applied but not saved: {err}"));
            false
        }
    }
}
