use crate::cmd::{open_project, open_store, report_save, resolve_cell};
use crate::output::{OutputMode, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct NoteArgs {
    /// Board name (exact or case-insensitive).
    pub board: String,
    /// Benchmark key or an unambiguous prefix of one.
    pub benchmark: String,
    /// Note text; words are joined with spaces. Omit to clear the note.
    #[arg(trailing_var_arg = true)]
    pub text: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NoteOutput {
    board: String,
    benchmark: String,
    notes: String,
    saved: bool,
}

/// Execute `bt note <board> <benchmark> [text...]`.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded, the lock is contended,
/// or the cell does not resolve.
pub fn run_note(args: &NoteArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root)?;
    let _lock = project.lock()?;
    let mut store = open_store(&project)?;
    let schema = store.schema().clone();
    let (board, key) = resolve_cell(&schema, &args.board, &args.benchmark)?;

    let text = args.text.join(" ");
    let outcome = store.set_note(board, key, text.clone())?;
    let saved = report_save(&outcome);

    render_mode(
        output,
        &NoteOutput {
            board: board.to_string(),
            benchmark: key.to_string(),
            notes: text,
            saved,
        },
        |n, w| writeln!(w, "{}\t{}\t{}", n.board, n.benchmark, n.notes),
        |n, w| {
            if n.notes.is_empty() {
                writeln!(w, "✓ cleared note on {} / {}", n.board, n.benchmark)
            } else {
                writeln!(w, "✓ note on {} / {}: {}", n.board, n.benchmark, n.notes)
            }
        },
    )
}
