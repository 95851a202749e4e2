use crate::cmd::{open_project, open_store};
use crate::tui::sheet::run_sheet_tui;
use anyhow::Result;
use std::io::IsTerminal;
use std::path::Path;

/// Execute `bt sheet`. Holds the project lock until the sheet is closed.
///
/// # Errors
///
/// Returns an error if stdout is not a terminal, the project cannot be
/// loaded or locked, or the terminal fails.
pub fn run_sheet(project_root: &Path) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        anyhow::bail!("`bt sheet` needs an interactive terminal; use `bt show <board>` instead.");
    }

    let project = open_project(project_root)?;
    let _lock = project.lock()?;
    let store = open_store(&project)?;
    run_sheet_tui(store, project.export_dir())
}
