use crate::cmd::set::{SlotChange, render_slot_change};
use crate::cmd::{open_project, open_store, report_save, resolve_cell};
use crate::output::OutputMode;
use anyhow::Result;
use benchtrack_core::{Slot, TrackError};
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// Board name (exact or case-insensitive).
    pub board: String,
    /// Benchmark key or an unambiguous prefix of one.
    pub benchmark: String,
    /// `small` or `fast`.
    pub slot: String,
}

/// Execute `bt cycle`: Not Started → Collected → Unable to Run → Not Started.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded, the lock is contended,
/// or any argument does not resolve.
pub fn run_cycle(args: &CycleArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let slot: Slot = args.slot.parse().map_err(TrackError::from)?;

    let project = open_project(project_root)?;
    let _lock = project.lock()?;
    let mut store = open_store(&project)?;
    let schema = store.schema().clone();
    let (board, key) = resolve_cell(&schema, &args.board, &args.benchmark)?;

    let previous = store.cell(board, key)?.get(slot);
    let (status, outcome) = store.cycle_status(board, key, slot)?;
    let saved = report_save(&outcome);

    render_slot_change(
        output,
        &SlotChange {
            board: board.to_string(),
            benchmark: key.to_string(),
            slot,
            previous,
            status,
            saved,
        },
    )
}
