//! `bt boards`: list boards in schema order with their progress.

use crate::cmd::{open_project, open_store};
use crate::output::{OutputMode, pretty_rule, render_mode};
use anyhow::Result;
use benchtrack_core::{Schema, Summary, TrackingTable, summarize_board};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct BoardProgress {
    pub board: String,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Progress of every board, in schema order.
pub fn board_progress(schema: &Schema, table: &TrackingTable) -> Vec<BoardProgress> {
    schema
        .boards()
        .iter()
        .map(|board| BoardProgress {
            board: board.clone(),
            summary: summarize_board(table, board),
        })
        .collect()
}

/// Execute `bt boards`.
///
/// # Errors
///
/// Returns an error if the project cannot be found or loaded.
pub fn run_boards(output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root)?;
    let store = open_store(&project)?;
    let boards = board_progress(store.schema(), store.table());

    render_mode(
        output,
        &boards,
        |b, w| render_boards_text(b, w),
        |b, w| render_boards_human(b, w),
    )
}

fn render_boards_text(boards: &[BoardProgress], w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "board\tpercent\tcollected\tunable_to_run\tnot_started")?;
    for b in boards {
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
}

fn render_boards_human(boards: &[BoardProgress], w: &mut dyn Write) -> std::io::Result<()> {
    let width = boards.iter().map(|b| b.board.len()).max().unwrap_or(5).max(5);
    writeln!(
        w,
        "{:<width$}  {:>5}  {:>9}  {:>6}  {:>11}",
        "BOARD", "DONE", "COLLECTED", "UNABLE", "NOT STARTED"
    )?;
    pretty_rule(w)?;
    for b in boards {
        writeln!(
            w,
            "{:<width$}  {:>4}%  {:>9}  {:>6}  {:>11}",
            b.board,
            b.summary.percent_complete,
            b.summary.collected,
            b.summary.unable_to_run,
            b.summary.not_started
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchtrack_core::matrix::build;
    use benchtrack_core::schema::BenchmarkCategory;
    use benchtrack_core::{Slot, Status};

    #[test]
    fn progress_follows_schema_order() {
        let schema = Schema::new(["Zeta", "Alpha"], vec![BenchmarkCategory::new("X", ["Y"])])
            .expect("schema");
        let mut table = build(&schema);
        table
            .cell_mut("Alpha", "X - Y")
            .expect("cell")
            .set(Slot::Fast, Status::Collected);

        let boards = board_progress(&schema, &table);
        assert_eq!(boards[0].board, "Zeta");
        assert_eq!(boards[1].board, "Alpha");
        assert_eq!(boards[1].summary.percent_complete, 50);

        let mut buf = Vec::new();
        render_boards_text(&boards, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Alpha\t50\t1\t0\t1"));
    }

    #[test]
    fn json_flattens_summary() {
        let boards = vec![BoardProgress {
            board: "A".to_string(),
            summary: Summary::default(),
        }];
        let value = serde_json::to_value(&boards).expect("json");
        assert_eq!(value[0]["board"], "A");
        assert_eq!(value[0]["percent_complete"], 0);
    }
}
