#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "bt: benchmark collection tracker for development boards",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a benchtrack project",
        long_about = "Create .benchtrack/ with a default config and a fresh tracking table \
                      where every cell is Not Started.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    bt init\n\n    # Reset tracking data, keeping config.toml\n    bt init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "List boards with their progress",
        after_help = "EXAMPLES:\n    # One line per board\n    bt boards\n\n    # Emit machine-readable output\n    bt boards --format json"
    )]
    Boards,

    #[command(
        next_help_heading = "Read",
        about = "Show every benchmark on one board",
        after_help = "EXAMPLES:\n    # Board names match case-insensitively\n    bt show esp32-c6"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Overall and per-board completion",
        after_help = "EXAMPLES:\n    bt summary\n    bt summary --format text"
    )]
    Summary,

    #[command(
        next_help_heading = "Track",
        about = "Set one slot of a cell to a status",
        after_help = "EXAMPLES:\n    # Mark the small build of a benchmark as collected\n    bt set ESP32 \"Person Detection - Standard\" small collected\n\n    # Benchmark keys accept unambiguous prefixes\n    bt set esp32-s3 person fast unable"
    )]
    Set(cmd::set::SetArgs),

    #[command(
        next_help_heading = "Track",
        about = "Advance one slot to the next status",
        after_help = "EXAMPLES:\n    bt cycle ESP32 \"Person Detection - Standard\" fast"
    )]
    Cycle(cmd::cycle::CycleArgs),

    #[command(
        next_help_heading = "Track",
        about = "Replace the note on a cell",
        after_help = "EXAMPLES:\n    bt note ESP32 \"Person Detection - Standard\" flash too small\n\n    # Clear a note\n    bt note ESP32 \"Person Detection - Standard\""
    )]
    Note(cmd::note::NoteArgs),

    #[command(
        next_help_heading = "Transfer",
        about = "Write a timestamped JSON snapshot",
        after_help = "EXAMPLES:\n    # Into the configured export directory\n    bt export\n\n    # Somewhere else\n    bt export --out-dir /tmp/snapshots\n\n    # To stdout\n    bt export --stdout"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Transfer",
        about = "Load a snapshot, reconciled with the current schema",
        after_help = "EXAMPLES:\n    bt import benchmark_tracking_data_2026-03-01_14-05.json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Interactive",
        about = "Open the interactive tracking sheet",
        after_help = "KEYS:\n    ←/→ board   ↑/↓ row   s/f cycle   n note   e export   i import   q quit"
    )]
    Sheet,

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    bt completions bash > ~/.local/share/bash-completion/completions/bt"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BENCHTRACK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "benchtrack=debug,info"
        } else {
            "benchtrack=info,warn"
        })
    });

    let format = env::var("BENCHTRACK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    debug!(root = %project_root.display(), ?output, "dispatching command");

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &project_root),
        Commands::Boards => cmd::boards::run_boards(output, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &project_root),
        Commands::Summary => cmd::summary::run_summary(output, &project_root),
        Commands::Set(ref args) => cmd::set::run_set(args, output, &project_root),
        Commands::Cycle(ref args) => cmd::cycle::run_cycle(args, output, &project_root),
        Commands::Note(ref args) => cmd::note::run_note(args, output, &project_root),
        Commands::Export(ref args) => cmd::export::run_export(args, output, &project_root),
        Commands::Import(ref args) => cmd::import::run_import(args, output, &project_root),
        Commands::Sheet => cmd::sheet::run_sheet(&project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = cli.output_mode();

    if let Err(err) = run(cli, output) {
        if render_error(output, &CliError::from(&err)).is_err() {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["bt", "--format", "json", "boards"]);
        assert_eq!(cli.format, Some(OutputMode::Json));

        let cli = Cli::parse_from(["bt", "summary", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn hidden_json_flag_forces_json() {
        let cli = Cli::parse_from(["bt", "boards", "--json"]);
        assert!(cli.json);
        assert_eq!(cli.output_mode(), OutputMode::Json);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["bt", "--format", "yaml", "boards"]).is_err());
    }

    #[test]
    fn set_subcommand_parses_positionals() {
        let cli = Cli::parse_from(["bt", "set", "ESP32", "X - Y", "small", "collected"]);
        match cli.command {
            Commands::Set(args) => {
                assert_eq!(args.board, "ESP32");
                assert_eq!(args.benchmark, "X - Y");
                assert_eq!(args.slot, "small");
                assert_eq!(args.status, "collected");
            }
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn note_joins_trailing_words() {
        let cli = Cli::parse_from(["bt", "note", "A", "X - Y", "flash", "too", "small"]);
        match cli.command {
            Commands::Note(args) => assert_eq!(args.text, ["flash", "too", "small"]),
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn export_out_dir_conflicts_with_stdout() {
        assert!(Cli::try_parse_from(["bt", "export", "--stdout", "--out-dir", "x"]).is_err());
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["bt", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["bt", "init"],
            vec!["bt", "init", "--force"],
            vec!["bt", "boards"],
            vec!["bt", "show", "A"],
            vec!["bt", "summary"],
            vec!["bt", "set", "A", "X", "fast", "unable"],
            vec!["bt", "cycle", "A", "X", "small"],
            vec!["bt", "note", "A", "X"],
            vec!["bt", "export"],
            vec!["bt", "import", "snap.json"],
            vec!["bt", "sheet"],
            vec!["bt", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
