//! pipelane-kernel: bounded-concurrency pipeline execution.
//!
//! Given a grid of stage specifications, where each column is one
//! pipe-connected process chain like `cmd1 | cmd2 | cmd3`, launch up to N
//! columns at once, wire each stage's stdout to the next stage's stdin
//! (or to files at the ends), and return once every launched pipeline has
//! drained.
//!
//! This crate provides:
//!
//! - **Plan**: the column-set grid and its tagged stage/endpoint specs
//! - **Scheduler**: the pipeline builder, the completion reaper, and the
//!   concurrency-bounded runner
//! - **Error**: one error type covering configuration, endpoint, spawn,
//!   and stage-failure conditions
//!
//! The kernel emits `tracing` events; installing a subscriber is the
//! embedding binary's business.

pub mod error;
pub mod plan;
pub mod scheduler;

pub use error::{Error, Result};
pub use plan::{ColumnSet, CommandSpec, InputSpec, OutputSpec, StageSpec};
pub use scheduler::{Runner, RunnerConfig};
