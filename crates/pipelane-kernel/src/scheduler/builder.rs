//! Pipeline construction: endpoint resolution, stage chaining, spawning.
//!
//! Builds one column of the grid into a running process chain. Each stage
//! except the last writes into a pipe that becomes the next stage's stdin;
//! the ends are wired to files or to the parent's own streams.

use std::fs::{File, OpenOptions};
use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::{Error, Result};
use crate::plan::{ColumnSet, CommandSpec, InputSpec, OutputSpec, StageSpec};

/// One live stage process plus enough context to report failures.
#[derive(Debug)]
pub(crate) struct StageHandle {
    pub(crate) child: Child,
    pub(crate) column: usize,
    pub(crate) stage: usize,
    pub(crate) program: String,
}

/// The materialized, running form of one column.
#[derive(Debug)]
pub(crate) struct PipelineInstance {
    pub(crate) column: usize,
    pub(crate) stages: Vec<StageHandle>,
}

/// Launch the process chain for one column.
///
/// Returns the spawned stage handles in launch order. File descriptors
/// handed to a child are consumed by the spawn; the orchestrator keeps no
/// copy of a pipe's write end or an endpoint file once the owning child is
/// running.
pub(crate) fn build_pipeline(
    set: &ColumnSet,
    column: usize,
    append: bool,
) -> Result<PipelineInstance> {
    let mut chain = set.column(column);

    // Resolve the input endpoint. Without a marker the first stage shares
    // the parent's stdin.
    let input = match chain.first() {
        Some(StageSpec::Input(spec)) => {
            let stdio = resolve_input(spec, column)?;
            chain.remove(0);
            stdio
        }
        _ => Stdio::inherit(),
    };

    // Resolve the output endpoint for the final stage.
    let output = match chain.last() {
        Some(StageSpec::Output(spec)) => {
            let stdio = resolve_output(spec, column, append)?;
            chain.pop();
            stdio
        }
        _ => Stdio::inherit(),
    };

    tracing::info!(column, stages = chain.len(), "launching pipeline");

    let Some((last_spec, interior)) = chain.split_last() else {
        // ColumnSet construction guarantees at least one command.
        return Err(Error::EmptyChain { column });
    };

    let mut stages = Vec::with_capacity(interior.len() + 1);
    let mut next_input = input;

    for (stage, spec) in interior.iter().enumerate() {
        let command = as_command(spec);
        let mut child = spawn_stage(command, next_input, Stdio::piped(), column, stage)?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Wire {
            column,
            stage,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "stage stdout was not captured"),
        })?;
        next_input = TryInto::<Stdio>::try_into(stdout).map_err(|source| Error::Wire {
            column,
            stage,
            source,
        })?;
        stages.push(StageHandle {
            child,
            column,
            stage,
            program: command.program.clone(),
        });
    }

    // The final stage writes to the resolved output endpoint.
    let stage = interior.len();
    let command = as_command(last_spec);
    let child = spawn_stage(command, next_input, output, column, stage)?;
    stages.push(StageHandle {
        child,
        column,
        stage,
        program: command.program.clone(),
    });

    Ok(PipelineInstance { column, stages })
}

fn as_command(spec: &StageSpec) -> &CommandSpec {
    match spec {
        StageSpec::Command(command) => command,
        // Interior endpoint markers are rejected at ColumnSet construction.
        _ => unreachable!("endpoint marker between commands"),
    }
}

/// Spawn one stage with the given stdio wiring.
///
/// The `Command` is dropped on return, which closes the orchestrator's
/// copies of whatever descriptors were passed in.
fn spawn_stage(
    spec: &CommandSpec,
    stdin: Stdio,
    stdout: Stdio,
    column: usize,
    stage: usize,
) -> Result<Child> {
    tracing::debug!(column, stage, program = %spec.program, "starting stage");
    let mut command = Command::new(&spec.program);
    command.args(&spec.args).stdin(stdin).stdout(stdout);
    command.spawn().map_err(|source| Error::Spawn {
        column,
        stage,
        program: spec.program.clone(),
        source,
    })
}

fn resolve_input(spec: &InputSpec, column: usize) -> Result<Stdio> {
    match spec {
        InputSpec::File(path) => {
            let file = File::open(path).map_err(|source| Error::Endpoint {
                column,
                path: path.clone(),
                source,
            })?;
            tracing::debug!(column, path = %path.display(), "opened input file");
            Ok(Stdio::from(file))
        }
        InputSpec::Inherit => Ok(Stdio::inherit()),
        InputSpec::Null => Ok(Stdio::null()),
    }
}

fn resolve_output(spec: &OutputSpec, column: usize, append: bool) -> Result<Stdio> {
    match spec {
        OutputSpec::File(path) => {
            let mut options = OpenOptions::new();
            if append {
                options.append(true).create(true);
            } else {
                options.write(true).create(true).truncate(true);
            }
            let file = options.open(path).map_err(|source| Error::Endpoint {
                column,
                path: path.clone(),
                source,
            })?;
            tracing::debug!(column, path = %path.display(), append, "opened output file");
            Ok(Stdio::from(file))
        }
        OutputSpec::Inherit => Ok(Stdio::inherit()),
    }
}
