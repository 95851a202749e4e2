use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::lock::LockError;
use crate::schema::{ResolveError, SchemaError};
use crate::storage::StorageError;

/// Machine-readable error codes for scripts and agents driving `bt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidSchema,
    CellNotFound,
    UnknownBoard,
    UnknownBenchmark,
    AmbiguousBenchmark,
    InvalidEnumValue,
    MalformedSnapshot,
    StorageWriteFailed,
    LockContention,
    StorageReadFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidSchema => "E1003",
            Self::CellNotFound => "E2001",
            Self::UnknownBoard => "E2002",
            Self::UnknownBenchmark => "E2003",
            Self::AmbiguousBenchmark => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::MalformedSnapshot => "E3001",
            Self::StorageWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::StorageReadFailed => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Tracking sheet not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidSchema => "Invalid board/benchmark schema",
            Self::CellNotFound => "Cell not found",
            Self::UnknownBoard => "Unknown board",
            Self::UnknownBenchmark => "Unknown benchmark",
            Self::AmbiguousBenchmark => "Ambiguous benchmark name",
            Self::InvalidEnumValue => "Invalid status/slot value",
            Self::MalformedSnapshot => "Malformed tracking snapshot",
            Self::StorageWriteFailed => "Tracking data write failed",
            Self::LockContention => "Lock contention",
            Self::StorageReadFailed => "Tracking data read failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `bt init` to create the tracking sheet here."),
            Self::ConfigParseError => Some("Fix syntax in .benchtrack/config.toml and retry."),
            Self::InvalidSchema => {
                Some("Board names and `<category> - <variant>` keys must be unique and non-empty.")
            }
            Self::CellNotFound => None,
            Self::UnknownBoard => Some("Run `bt boards` to list the known boards."),
            Self::UnknownBenchmark => Some("Run `bt show <board>` to list the benchmark keys."),
            Self::AmbiguousBenchmark => Some("Use a longer benchmark prefix to disambiguate."),
            Self::InvalidEnumValue => Some(
                "Use a status of `Not Started`, `Collected` or `Unable to Run`, and a slot of `small` or `fast`.",
            ),
            Self::MalformedSnapshot => {
                Some("The file must be JSON shaped like {board: {benchmark: {small, fast, notes}}}.")
            }
            Self::StorageWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `bt` process releases its lock."),
            Self::StorageReadFailed => Some("Check read permissions on .benchtrack/."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Snapshot bytes (persisted table or import file) that are not JSON.
///
/// Any JSON value reconciles, so this is the only way a snapshot is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for tracking-sheet operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("malformed snapshot: {0}")]
    Parse(#[from] ParseError),

    #[error("no cell for board '{board}', benchmark '{key}'")]
    Lookup { board: String, key: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("no tracking sheet found at {}", .path.display())]
    NotInitialized { path: PathBuf },
}

impl TrackError {
    pub(crate) fn lookup(board: &str, key: &str) -> Self {
        Self::Lookup {
            board: board.to_string(),
            key: key.to_string(),
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::MalformedSnapshot,
            Self::Lookup { .. } => ErrorCode::CellNotFound,
            Self::Resolve(err) => err.code(),
            Self::Schema(_) => ErrorCode::InvalidSchema,
            Self::Config(_) => ErrorCode::ConfigParseError,
            Self::Storage(err) => err.code(),
            Self::Lock(err) => err.code(),
            Self::NotInitialized { .. } => ErrorCode::NotInitialized,
        }
    }

    /// Remediation text, falling back to the code's short message.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, ParseError, TrackError};
    use std::collections::HashSet;

    const ALL: [ErrorCode; 13] = [
        ErrorCode::NotInitialized,
        ErrorCode::ConfigParseError,
        ErrorCode::InvalidSchema,
        ErrorCode::CellNotFound,
        ErrorCode::UnknownBoard,
        ErrorCode::UnknownBenchmark,
        ErrorCode::AmbiguousBenchmark,
        ErrorCode::InvalidEnumValue,
        ErrorCode::MalformedSnapshot,
        ErrorCode::StorageWriteFailed,
        ErrorCode::LockContention,
        ErrorCode::StorageReadFailed,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let code = code.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn lookup_error_names_the_cell() {
        let err = TrackError::lookup("ESP32", "Nope - Standard");
        assert_eq!(err.error_code(), ErrorCode::CellNotFound);
        let text = err.to_string();
        assert!(text.contains("ESP32"));
        assert!(text.contains("Nope - Standard"));
        // No hint registered: falls back to the short message.
        assert_eq!(err.suggestion(), "Cell not found");
    }

    #[test]
    fn parse_error_maps_to_snapshot_code() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated JSON");
        let err = TrackError::from(ParseError::from(json_err));
        assert_eq!(err.error_code(), ErrorCode::MalformedSnapshot);
        assert!(err.suggestion().contains("JSON"));
    }
}
