//! The column-set grid: what to run, in which positions.
//!
//! A plan is a grid of stage specifications. Row `i` holds the stage-`i`
//! entry of every column; reading column `j` top to bottom yields one
//! pipe-connected chain, `row0 | row1 | ... | rowN`. The first row may
//! carry input endpoint markers and the last row output endpoint markers;
//! everything in between is a command.
//!
//! Endpoints are explicit tagged variants rather than sentinel values, so
//! "read this file", "share the parent's stream", and "read nothing" are
//! three distinct, unambiguous spellings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the first stage of a column reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSpec {
    /// A named file, opened read-only when the pipeline launches.
    File(PathBuf),
    /// The orchestrating process's own standard input. Columns that
    /// inherit share the one underlying stream; the bytes are not
    /// duplicated per column.
    Inherit,
    /// The null device. The column reads nothing and leaves the parent's
    /// stdin alone.
    Null,
}

/// Where the last stage of a column writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSpec {
    /// A named file: truncated on open by default, appended to when the
    /// runner is configured for append mode.
    File(PathBuf),
    /// The orchestrating process's own standard output.
    Inherit,
}

/// One command and its arguments, run as a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Executable name, resolved through `PATH` by the OS.
    pub program: String,
    /// Arguments, passed through verbatim.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build a command spec from a program name and its arguments.
    pub fn new<P, A, S>(program: P, args: A) -> Self
    where
        P: Into<String>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// One cell of the grid: a command, or a file endpoint marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSpec {
    /// Input endpoint marker. Valid only in the first stage row.
    Input(InputSpec),
    /// Output endpoint marker. Valid only in the last stage row.
    Output(OutputSpec),
    /// A command to execute as one stage.
    Command(CommandSpec),
}

/// A validated grid of stage specifications.
///
/// Construction checks the shape once (uniform row widths, endpoint
/// markers only at the ends, at least one command per column) so the
/// scheduler core never re-checks it.
#[derive(Debug, Clone)]
pub struct ColumnSet {
    rows: Vec<Vec<StageSpec>>,
    width: usize,
}

impl ColumnSet {
    /// Validate a grid of stage rows.
    pub fn new(rows: Vec<Vec<StageSpec>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Empty);
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(Error::Empty);
        }
        for (row, entries) in rows.iter().enumerate() {
            if entries.len() != width {
                return Err(Error::RaggedRow {
                    row,
                    expected: width,
                    found: entries.len(),
                });
            }
        }

        let depth = rows.len();
        for column in 0..width {
            let mut commands = 0;
            for (stage, row) in rows.iter().enumerate() {
                match &row[column] {
                    StageSpec::Input(_) if stage != 0 => {
                        return Err(Error::MisplacedEndpoint { column, stage });
                    }
                    StageSpec::Output(_) if stage != depth - 1 => {
                        return Err(Error::MisplacedEndpoint { column, stage });
                    }
                    StageSpec::Command(_) => commands += 1,
                    _ => {}
                }
            }
            if commands == 0 {
                return Err(Error::EmptyChain { column });
            }
        }

        Ok(Self { rows, width })
    }

    /// Number of parallel columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of stage rows, endpoint rows included.
    pub fn depth(&self) -> usize {
        self.rows.len()
    }

    /// The chain for one column, top to bottom.
    pub(crate) fn column(&self, index: usize) -> Vec<&StageSpec> {
        self.rows.iter().map(|row| &row[index]).collect()
    }
}
