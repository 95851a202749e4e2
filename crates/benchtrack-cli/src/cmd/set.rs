use crate::cmd::{open_project, open_store, report_save, resolve_cell};
use crate::output::{OutputMode, render_mode};
use anyhow::Result;
use benchtrack_core::{Slot, Status, TrackError};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Board name (exact or case-insensitive).
    pub board: String,
    /// Benchmark key or an unambiguous prefix of one.
    pub benchmark: String,
    /// `small` or `fast`.
    pub slot: String,
    /// `Not Started`, `Collected`, `Unable to Run`, or a short alias
    /// (`todo`, `done`, `unable`).
    pub status: String,
}

/// Result of a single-slot change, shared by `set` and `cycle`.
#[derive(Debug, Serialize)]
pub struct SlotChange {
    pub board: String,
    pub benchmark: String,
    pub slot: Slot,
    pub previous: Status,
    pub status: Status,
    pub saved: bool,
}

pub fn render_slot_change(output: OutputMode, change: &SlotChange) -> Result<()> {
    render_mode(
        output,
        change,
        |c, w| writeln!(w, "{}\t{}\t{}\t{}", c.board, c.benchmark, c.slot, c.status),
        |c, w| {
            writeln!(
                w,
                "✓ {} / {} [{}]: {} → {}",
                c.board, c.benchmark, c.slot, c.previous, c.status
            )
        },
    )
}

/// Execute `bt set <board> <benchmark> <slot> <status>`.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded, the lock is contended,
/// or any argument does not resolve.
pub fn run_set(args: &SetArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let slot: Slot = args.slot.parse().map_err(TrackError::from)?;
    let status: Status = args.status.parse().map_err(TrackError::from)?;

    let project = open_project(project_root)?;
    let _lock = project.lock()?;
    let mut store = open_store(&project)?;
    let schema = store.schema().clone();
    let (board, key) = resolve_cell(&schema, &args.board, &args.benchmark)?;

    let previous = store.cell(board, key)?.get(slot);
    let outcome = store.set_status(board, key, slot, status)?;
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
