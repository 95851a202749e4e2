use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use benchtrack_core::config::StorageConfig;
use benchtrack_core::lock::StoreLock;
use benchtrack_core::TrackError;
use benchtrack_core::project::{LOCK_FILE, PROJECT_DIR, Project};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Reset the tracking data even if `.benchtrack/` already exists.
    /// An existing `config.toml` is kept.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    dir: String,
    snapshot: String,
    boards: usize,
    benchmarks: usize,
    cells: usize,
}

/// Execute `bt init`. Creates the project skeleton:
///
/// ```text
/// .benchtrack/
///   config.toml     (default project config, kept on --force)
///   tracking.json   (fresh sheet, every slot Not Started)
/// ```
///
/// # Errors
///
/// Returns an error if `.benchtrack/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let dir = project_root.join(PROJECT_DIR);
    if dir.exists() && !args.force {
        anyhow::bail!("{PROJECT_DIR}/ already exists. Use `bt init --force` to reset it.");
    }

    let _lock = StoreLock::acquire(
        &dir.join(LOCK_FILE),
        StorageConfig::default().lock_timeout(),
    )
    .map_err(TrackError::from)?;
    let project = Project::init(project_root)?;
    let schema = project.schema()?;

    let result = InitOutput {
        ok: true,
        dir: project.dir().display().to_string(),
        snapshot: project.storage().path().display().to_string(),
        boards: schema.boards().len(),
        benchmarks: schema.rows().len(),
        cells: schema.cell_count(),
    };

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(w, "initialized {}", r.dir)?;
            writeln!(w, "{} boards x {} benchmarks = {} cells", r.boards, r.benchmarks, r.cells)
        },
        |r, w| {
            pretty_section(w, &format!("✓ Initialized {PROJECT_DIR}/"))?;
            pretty_kv(w, "snapshot", &r.snapshot)?;
            pretty_kv(w, "boards", r.boards.to_string())?;
            pretty_kv(w, "benchmarks", r.benchmarks.to_string())?;
            pretty_kv(w, "cells", r.cells.to_string())?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  bt boards                      # progress per board")?;
            writeln!(w, "  bt sheet                       # interactive sheet")?;
            writeln!(w, "  bt set <board> <bench> small collected")
        },
    )
}
