//! benchtrack-core library.
//!
//! Tracks benchmark data collection across development boards: a fixed
//! schema of boards and `<category> - <variant>` benchmarks, a table of
//! per-cell `small`/`fast` statuses with notes, and a reconciler that keeps
//! persisted or imported snapshots aligned with the current schema.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums mapped onto [`error::ErrorCode`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod aggregate;
pub mod config;
pub mod error;
pub mod lock;
pub mod matrix;
pub mod model;
pub mod project;
pub mod reconcile;
pub mod schema;
pub mod storage;
pub mod store;
pub mod transfer;

pub use aggregate::{Summary, summarize, summarize_board};
pub use error::{ErrorCode, ParseError, TrackError};
pub use model::{Cell, Slot, TrackingTable};
pub use reconcile::MergeReport;
pub use schema::{Schema, Status};
pub use store::{LoadReport, SaveOutcome, Store};
