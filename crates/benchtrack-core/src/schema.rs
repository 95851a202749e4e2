//! Schema registry: the closed set of boards, benchmark categories with their
//! variants, and the status enumeration.
//!
//! The registry is pure data. A tracking table is "complete" for a schema
//! when it holds exactly one cell per (board, benchmark key) pair, where the
//! key of a variant is `"<category> - <variant>"`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Tracking status of one optimization slot.
///
/// Serialized as the display label, which is the wire contract for
/// persisted and exported snapshots.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "Collected")]
    Collected,
    #[serde(rename = "Unable to Run")]
    UnableToRun,
}

impl Status {
    /// All statuses in cycle order.
    pub const ALL: [Self; 3] = [Self::NotStarted, Self::Collected, Self::UnableToRun];

    /// Wire and display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Collected => "Collected",
            Self::UnableToRun => "Unable to Run",
        }
    }

    /// Display color as a `#rrggbb` hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::NotStarted => "#f0f0f0",
            Self::Collected => "#c6efce",
            Self::UnableToRun => "#ffc7ce",
        }
    }

    /// Display color as an RGB triple.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::NotStarted => (0xf0, 0xf0, 0xf0),
            Self::Collected => (0xc6, 0xef, 0xce),
            Self::UnableToRun => (0xff, 0xc7, 0xce),
        }
    }

    /// Next status in the fixed cycle
    /// `Not Started -> Collected -> Unable to Run -> Not Started`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::NotStarted => Self::Collected,
            Self::Collected => Self::UnableToRun,
            Self::UnableToRun => Self::NotStarted,
        }
    }

    /// Whether the slot counts towards progress. Unable to Run is resolved
    /// just like Collected.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::NotStarted)
    }

    /// Exact match against the wire label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == label)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = ResolveError;

    /// Accepts the label in any case, its kebab/snake spelling, or a short
    /// alias (`n`, `c`, `u`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | '_' => ' ',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "not started" | "notstarted" | "n" | "todo" => Ok(Self::NotStarted),
            "collected" | "c" | "done" => Ok(Self::Collected),
            "unable to run" | "unable" | "u" | "failed" => Ok(Self::UnableToRun),
            _ => Err(ResolveError::InvalidValue {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// A benchmark category and its ordered variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkCategory {
    pub name: String,
    pub variants: Vec<String>,
}

impl BenchmarkCategory {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// Compose the stable lookup key of a (category, variant) pair.
#[must_use]
pub fn benchmark_key(category: &str, variant: &str) -> String {
    format!("{category} - {variant}")
}

/// One displayable benchmark row, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRow {
    pub key: String,
    pub category: String,
    pub variant: String,
    /// First row of its category.
    pub opens_category: bool,
    /// The category has exactly one variant.
    pub single_variant: bool,
}

impl BenchmarkRow {
    /// Row label: the category name for single-variant categories, the
    /// variant name otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.single_variant {
            &self.category
        } else {
            &self.variant
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema must define at least one board")]
    NoBoards,

    #[error("board names must not be empty")]
    EmptyBoardName,

    #[error("board '{0}' is listed more than once")]
    DuplicateBoard(String),

    #[error("category '{0}' has no variants")]
    EmptyCategory(String),

    #[error("benchmark key '{0}' is produced by more than one category/variant pair")]
    DuplicateKey(String),
}

/// Failure to map user input onto the schema or the status/slot enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown board '{0}'")]
    UnknownBoard(String),

    #[error("unknown benchmark '{0}'")]
    UnknownBenchmark(String),

    #[error("benchmark '{input}' is ambiguous: matches {}", .candidates.join(", "))]
    AmbiguousBenchmark {
        input: String,
        candidates: Vec<String>,
    },

    #[error("invalid {kind} '{value}'")]
    InvalidValue { kind: &'static str, value: String },
}

impl ResolveError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownBoard(_) => ErrorCode::UnknownBoard,
            Self::UnknownBenchmark(_) => ErrorCode::UnknownBenchmark,
            Self::AmbiguousBenchmark { .. } => ErrorCode::AmbiguousBenchmark,
            Self::InvalidValue { .. } => ErrorCode::InvalidEnumValue,
        }
    }
}

/// The fixed set of boards and benchmarks a tracking table covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    boards: Vec<String>,
    categories: Vec<BenchmarkCategory>,
    rows: Vec<BenchmarkRow>,
}

static BUILTIN: LazyLock<Schema> = LazyLock::new(|| {
    let boards = [
        "ESP32",
        "ESP32-S3",
        "ESP32-C6",
        "ESP32-P4",
        "Raspberry Pi Pico W",
        "Arduino Nano 33 BLE",
        "Teensy 4.0",
        "STM32 Nucleo L552ZE-Q",
        "STM32 Nucleo F207ZG",
    ];
    let categories = vec![
        BenchmarkCategory::new("Person Detection", ["Standard"]),
        BenchmarkCategory::new("Speech Yes No", ["Standard"]),
        BenchmarkCategory::new("KWS Scrambled", ["8-bit Model", "Standard Model"]),
        BenchmarkCategory::new("Visual Wakeword", ["128x128x1 Model", "96x96x3 Model"]),
        BenchmarkCategory::new(
            "Keyword Spotting",
            [
                "CNN Small Float32",
                "CNN Medium Float32",
                "CNN Small Int8",
                "CNN Medium Int8",
                "CNN Large Int8",
                "DNN Small Int8",
                "DNN Medium Int8",
                "DNN Large Int8",
                "DNN Small Float32",
                "DNN Medium Float32",
                "DS-CNN Small Int8",
                "DS-CNN Medium Int8",
                "DS-CNN Large Int8",
                "DS-CNN Small Float32",
                "DS-CNN Medium Float32",
                "DS-CNN Small Int16",
                "MicroNet Small Int8",
                "MicroNet Medium Int8",
            ],
        ),
        BenchmarkCategory::new("Noise Reduction", ["Standard"]),
    ];

    match Schema::new(boards, categories) {
        Ok(schema) => schema,
        Err(err) => unreachable!("built-in schema is invalid: {err}"),
    }
});

impl Schema {
    /// Build and validate a schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when there are no boards, a board name is empty
    /// or repeated, a category has no variants, or two (category, variant)
    /// pairs produce the same benchmark key.
    pub fn new<I, S>(boards: I, categories: Vec<BenchmarkCategory>) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let boards: Vec<String> = boards.into_iter().map(Into::into).collect();
        if boards.is_empty() {
            return Err(SchemaError::NoBoards);
        }

        let mut seen_boards = HashSet::new();
        for board in &boards {
            if board.trim().is_empty() {
                return Err(SchemaError::EmptyBoardName);
            }
            if !seen_boards.insert(board.as_str()) {
                return Err(SchemaError::DuplicateBoard(board.clone()));
            }
        }

        let mut rows = Vec::new();
        let mut seen_keys = HashSet::new();
        for category in &categories {
            if category.variants.is_empty() {
                return Err(SchemaError::EmptyCategory(category.name.clone()));
            }
            let single_variant = category.variants.len() == 1;
            for (index, variant) in category.variants.iter().enumerate() {
                let key = benchmark_key(&category.name, variant);
                if !seen_keys.insert(key.clone()) {
                    return Err(SchemaError::DuplicateKey(key));
                }
                rows.push(BenchmarkRow {
                    key,
                    category: category.name.clone(),
                    variant: variant.clone(),
                    opens_category: index == 0,
                    single_variant,
                });
            }
        }

        Ok(Self {
            boards,
            categories,
            rows,
        })
    }

    /// The built-in registry of 9 boards and 6 benchmark categories.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    #[must_use]
    pub fn boards(&self) -> &[String] {
        &self.boards
    }

    #[must_use]
    pub fn categories(&self) -> &[BenchmarkCategory] {
        &self.categories
    }

    /// Benchmark rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[BenchmarkRow] {
        &self.rows
    }

    /// Benchmark keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.key.as_str())
    }

    #[must_use]
    pub fn has_board(&self, board: &str) -> bool {
        self.boards.iter().any(|b| b == board)
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.rows.iter().any(|row| row.key == key)
    }

    /// Number of cells in a complete table (boards x benchmark keys).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.boards.len() * self.rows.len()
    }

    /// Resolve a board name: exact match, then case-insensitive match.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownBoard`] when nothing matches.
    pub fn resolve_board(&self, input: &str) -> Result<&str, ResolveError> {
        let input = input.trim();
        self.boards
            .iter()
            .find(|b| *b == input)
            .or_else(|| self.boards.iter().find(|b| b.eq_ignore_ascii_case(input)))
            .map(String::as_str)
            .ok_or_else(|| ResolveError::UnknownBoard(input.to_string()))
    }

    /// Resolve a benchmark key: exact match, case-insensitive match, then a
    /// unique case-insensitive prefix (so `person` finds
    /// `Person Detection - Standard`).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownBenchmark`] when nothing matches and
    /// [`ResolveError::AmbiguousBenchmark`] when a prefix matches several keys.
    pub fn resolve_key(&self, input: &str) -> Result<&str, ResolveError> {
        let input = input.trim();
        if let Some(row) = self.rows.iter().find(|row| row.key == input) {
            return Ok(&row.key);
        }
        if let Some(row) = self.rows.iter().find(|row| row.key.eq_ignore_ascii_case(input)) {
            return Ok(&row.key);
        }

        let needle = input.to_lowercase();
        if needle.is_empty() {
            return Err(ResolveError::UnknownBenchmark(input.to_string()));
        }
        let matches: Vec<&str> = self
            .keys()
            .filter(|key| key.to_lowercase().starts_with(&needle))
            .collect();

        match matches.as_slice() {
            [] => Err(ResolveError::UnknownBenchmark(input.to_string())),
            [only] => Ok(*only),
            many => Err(ResolveError::AmbiguousBenchmark {
                input: input.to_string(),
                candidates: many.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}
