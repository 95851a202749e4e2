//! `bt show`: one board's benchmark rows.
//!
//! Rows follow schema order and are grouped by category. Single-variant
//! categories render as one row labelled with the category name.

use crate::cmd::{open_project, open_store};
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode, summary_line};
use anyhow::Result;
use benchtrack_core::{Schema, Status, Summary, TrackError, TrackingTable, summarize_board};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Board name (exact or case-insensitive).
    pub board: String,
}

#[derive(Debug, Serialize)]
pub struct ShowBoard {
    pub board: String,
    pub summary: Summary,
    pub rows: Vec<ShowRow>,
}

#[derive(Debug, Serialize)]
pub struct ShowRow {
    pub key: String,
    pub category: String,
    pub variant: String,
    #[serde(skip)]
    pub label: String,
    #[serde(skip)]
    pub opens_category: bool,
    #[serde(skip)]
    pub single_variant: bool,
    pub small: Status,
    pub fast: Status,
    pub notes: String,
}

/// Collect a board's rows in schema order.
///
/// # Errors
///
/// Returns [`TrackError::Lookup`] if the table lacks a schema cell, which a
/// reconciled table never does.
pub fn collect_board(
    schema: &Schema,
    table: &TrackingTable,
    board: &str,
) -> Result<ShowBoard, TrackError> {
    let rows = schema
        .rows()
        .iter()
        .map(|row| {
            let cell = table
                .cell(board, &row.key)
                .ok_or_else(|| TrackError::Lookup {
                    board: board.to_string(),
                    key: row.key.clone(),
                })?;
            Ok(ShowRow {
                key: row.key.clone(),
                category: row.category.clone(),
                variant: row.variant.clone(),
                label: row.label().to_string(),
                opens_category: row.opens_category,
                single_variant: row.single_variant,
                small: cell.small,
                fast: cell.fast,
                notes: cell.notes.clone(),
            })
        })
        .collect::<Result<Vec<_>, TrackError>>()?;

    Ok(ShowBoard {
        board: board.to_string(),
        summary: summarize_board(table, board),
        rows,
    })
}

/// Execute `bt show <board>`.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded or the board is unknown.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root)?;
    let store = open_store(&project)?;
    let board = store
        .schema()
        .resolve_board(&args.board)
        .map_err(TrackError::from)?;
    let view = collect_board(store.schema(), store.table(), board)?;

    render_mode(output, &view, render_show_text, render_show_human)
}

fn render_show_text(view: &ShowBoard, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "benchmark\tsmall\tfast\tnotes")?;
    for row in &view.rows {
        writeln!(w, "{}\t{}\t{}\t{}", row.key, row.small, row.fast, row.notes)?;
    }
    Ok(())
}

fn render_show_human(view: &ShowBoard, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Board {}", view.board))?;
    let width = view
        .rows
        .iter()
        .map(|r| r.label.len() + 2)
        .max()
        .unwrap_or(9)
        .max(9);

    writeln!(w, "{:<width$}  {:<13}  {:<13}  NOTES", "BENCHMARK", "SMALL", "FAST")?;
    for row in &view.rows {
        if row.opens_category && !row.single_variant {
            writeln!(w, "{}", row.category)?;
        }
        let label = if row.single_variant {
            row.label.clone()
        } else {
            format!("  {}", row.label)
        };
        writeln!(
            w,
            "{:<width$}  {:<13}  {:<13}  {}",
            label,
            row.small.label(),
            row.fast.label(),
            row.notes
        )?;
    }
    pretty_rule(w)?;
    writeln!(w, "{}", summary_line(&view.summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchtrack_core::matrix::build;
    use benchtrack_core::schema::BenchmarkCategory;

    fn schema() -> Schema {
        Schema::new(
            ["A"],
            vec![
                BenchmarkCategory::new("Solo", ["Standard"]),
                BenchmarkCategory::new("Multi", ["One", "Two"]),
            ],
        )
        .expect("schema")
    }

    #[test]
    fn rows_follow_schema_order() {
        let schema = schema();
        let view = collect_board(&schema, &build(&schema), "A").expect("collect");
        let keys: Vec<_> = view.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Solo - Standard", "Multi - One", "Multi - Two"]);
        assert_eq!(view.rows[0].label, "Solo");
        assert_eq!(view.rows[2].label, "Two");
    }

    #[test]
    fn human_output_groups_categories() {
        let schema = schema();
        let mut table = build(&schema);
        table.cell_mut("A", "Multi - Two").expect("cell").notes = "retry".to_string();
        let view = collect_board(&schema, &table, "A").expect("collect");

        let mut buf = Vec::new();
        render_show_human(&view, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("\nMulti\n"));
        assert!(text.contains("  Two"));
        assert!(text.contains("retry"));
        assert!(!text.contains("\nSolo\n"));
    }

    #[test]
    fn json_uses_wire_labels() {
        let schema = schema();
        let view = collect_board(&schema, &build(&schema), "A").expect("collect");
        let value = serde_json::to_value(&view).expect("json");
        assert_eq!(value["rows"][0]["small"], "Not Started");
        assert!(value["rows"][0].get("label").is_none());
    }

    #[test]
    fn missing_board_is_a_lookup_error() {
        let schema = schema();
        let err = collect_board(&schema, &build(&schema), "B").unwrap_err();
        assert!(matches!(err, TrackError::Lookup { .. }));
    }
}
