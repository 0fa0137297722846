//! The scheduler core — pipeline construction, completion reaping, and the
//! concurrency-bounded orchestrator.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Runner                              │
//! │   while columns remain:                                      │
//! │     drain_to(cap − 1) ──▶ reaper: poll, remove exited stages │
//! │     build_pipeline(..) ──▶ builder: open endpoints, spawn    │
//! │   drain_to(0)                                                │
//! │                                                              │
//! │   column:  file ──▶ [stage 0] ─pipe▶ [stage 1] ──▶ file      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The builder and reaper never call each other; the runner drives both.
//! Parallelism is child processes only: one task owns the in-flight set
//! for the whole run.

pub(crate) mod builder;
pub(crate) mod reaper;
mod runner;

pub use runner::{Runner, RunnerConfig};
