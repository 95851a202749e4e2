use crate::cmd::{open_project, open_store, report_save};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, summary_line};
use anyhow::{Context as _, Result};
use benchtrack_core::transfer::import_snapshot;
use benchtrack_core::{MergeReport, Summary, TrackError};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Snapshot file previously written by `bt export`.
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ImportOutput {
    file: String,
    #[serde(flatten)]
    report: MergeReport,
    summary: Summary,
    saved: bool,
}

/// Execute `bt import <file>`.
///
/// The snapshot is reconciled with the current schema: unknown boards and
/// benchmarks are dropped and missing ones start at Not Started. Entries of
/// the wrong shape are reported as unreadable. A file that is not JSON
/// changes nothing.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a tracking
/// snapshot, or if the project cannot be loaded or locked.
pub fn run_import(args: &ImportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let project = open_project(project_root)?;
    let _lock = project.lock()?;
    let mut store = open_store(&project)?;

    let (table, report) = import_snapshot(store.schema(), &bytes).map_err(TrackError::from)?;
    let saved = report_save(&store.replace_all(table));

    let result = ImportOutput {
        file: args.file.display().to_string(),
        report,
        summary: store.summary(),
        saved,
    };

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(
                w,
                "restored\t{}\ndefaulted\t{}\ndropped_boards\t{}\ndropped_benchmarks\t{}\nunreadable\t{}",
                r.report.restored,
                r.report.defaulted,
                r.report.dropped_boards.len(),
                r.report.dropped_keys.len(),
                r.report.unreadable.len()
            )
        },
        |r, w| {
            pretty_section(w, &format!("✓ Imported {}", r.file))?;
            pretty_kv(w, "restored", r.report.restored.to_string())?;
            pretty_kv(w, "defaulted", r.report.defaulted.to_string())?;
            if !r.report.dropped_boards.is_empty() {
                pretty_kv(w, "dropped", r.report.dropped_boards.join(", "))?;
            }
            for (board, key) in &r.report.dropped_keys {
                pretty_kv(w, "dropped", format!("{board} / {key}"))?;
            }
            for entry in &r.report.unreadable {
                pretty_kv(w, "unreadable", entry)?;
            }
            writeln!(w)?;
            writeln!(w, "{}", summary_line(&r.summary))
        },
    )
}
