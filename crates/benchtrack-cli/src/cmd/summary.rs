use crate::cmd::boards::{BoardProgress, board_progress};
use crate::cmd::{open_project, open_store};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode, summary_line};
use anyhow::Result;
use benchtrack_core::Summary;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct SummaryOutput {
    overall: Summary,
    boards: Vec<BoardProgress>,
}

/// Execute `bt summary`: overall progress plus one line per board.
///
/// # Errors
///
/// Returns an error if the project cannot be found or loaded.
pub fn run_summary(output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root)?;
    let store = open_store(&project)?;
    let report = SummaryOutput {
        overall: store.summary(),
        boards: board_progress(store.schema(), store.table()),
    };

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "overall\t{}\t{}\t{}\t{}",
                r.overall.percent_complete,
                r.overall.collected,
                r.overall.unable_to_run,
                r.overall.not_started
            )?;
            for b in &r.boards {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}",
                    b.board,
                    b.summary.percent_complete,
                    b.summary.collected,
                    b.summary.unable_to_run,
                    b.summary.not_started
                )?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, "Progress")?;
            pretty_kv(w, "Not Started", r.overall.not_started.to_string())?;
            pretty_kv(w, "Collected", r.overall.collected.to_string())?;
            pretty_kv(w, "Unable to Run", r.overall.unable_to_run.to_string())?;
            pretty_kv(w, "Complete", format!("{}%", r.overall.percent_complete))?;
            writeln!(w)?;
            pretty_section(w, "Boards")?;
            for b in &r.boards {
                writeln!(w, "{:<20} {}", b.board, summary_line(&b.summary))?;
            }
            pretty_rule(w)
        },
    )
}
