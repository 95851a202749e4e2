use crate::cmd::{open_project, open_store};
use crate::output::{OutputMode, render_mode};
use anyhow::{Context as _, Result};
use benchtrack_core::transfer::{export_snapshot_now, write_snapshot};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory for the snapshot file (defaults to `export.dir` from the
    /// project config).
    #[arg(long, value_name = "DIR", conflicts_with = "stdout")]
    pub out_dir: Option<PathBuf>,

    /// Write the snapshot JSON to stdout instead of a file.
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    path: String,
    filename: String,
    cells: usize,
}

/// Execute `bt export`. Writes `benchmark_tracking_data_<timestamp>.json`.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded or the file cannot be
/// written.
pub fn run_export(args: &ExportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root)?;
    let store = open_store(&project)?;
    let snapshot =
        export_snapshot_now(store.table()).context("failed to serialize tracking table")?;

    if args.stdout {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(&snapshot.bytes)?;
        writeln!(out)?;
        return Ok(());
    }

    let dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| project.export_dir());
    let path = write_snapshot(&snapshot, &dir)
        .with_context(|| format!("failed to write snapshot into {}", dir.display()))?;

    render_mode(
        output,
        &ExportOutput {
            path: path.display().to_string(),
            filename: snapshot.filename,
            cells: store.table().len(),
        },
        |e, w| writeln!(w, "{}", e.path),
        |e, w| writeln!(w, "✓ exported {} cells to {}", e.cells, e.path),
    )
}
