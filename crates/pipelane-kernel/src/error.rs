//! Error types for the pipelane kernel.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a run.
///
/// All variants are fatal: the first occurrence aborts the whole
/// orchestration, nothing is retried, and pipelines already in flight are
/// left running.
#[derive(Debug, Error)]
pub enum Error {
    /// A concurrency cap of zero would never launch anything.
    #[error("concurrency cap must be at least 1")]
    ZeroConcurrency,

    /// The grid has no stage rows, or rows with no columns.
    #[error("column set is empty")]
    Empty,

    /// A stage row with a different number of columns than the first row.
    #[error("stage row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An endpoint marker somewhere other than the first or last stage row.
    #[error("column {column}: endpoint marker at interior stage {stage}")]
    MisplacedEndpoint { column: usize, stage: usize },

    /// A column with no commands left once endpoint markers are removed.
    #[error("column {column}: no commands between endpoints")]
    EmptyChain { column: usize },

    /// A named endpoint file could not be opened.
    #[error("column {column}: cannot open {}: {source}", .path.display())]
    Endpoint {
        column: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS could not start a stage process.
    #[error("column {column} stage {stage}: failed to spawn `{program}`: {source}")]
    Spawn {
        column: usize,
        stage: usize,
        program: String,
        #[source]
        source: io::Error,
    },

    /// A stage's captured stdout could not be handed to the next stage.
    #[error("column {column} stage {stage}: failed to wire pipe: {source}")]
    Wire {
        column: usize,
        stage: usize,
        #[source]
        source: io::Error,
    },

    /// Querying a stage's exit status failed.
    #[error("column {column} stage {stage}: failed to poll `{program}`: {source}")]
    Poll {
        column: usize,
        stage: usize,
        program: String,
        #[source]
        source: io::Error,
    },

    /// A stage exited with a non-zero status.
    #[error("column {column} stage {stage}: `{program}` exited with code {code}")]
    StageFailed {
        column: usize,
        stage: usize,
        program: String,
        code: i32,
    },
}
