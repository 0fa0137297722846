//! The orchestrator: launch pipelines up to the cap, drain, repeat.

use crate::error::{Error, Result};
use crate::plan::ColumnSet;
use crate::scheduler::builder::{build_pipeline, PipelineInstance};
use crate::scheduler::reaper::drain_to;

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum number of pipelines in flight at once.
    pub concurrency: usize,
    /// Open output-file endpoints in append mode instead of truncating.
    pub append: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            append: false,
        }
    }
}

/// Drives a column set to completion under the concurrency cap.
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner. A concurrency cap of zero is rejected: it would
    /// either never launch anything or loop forever.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(Error::ZeroConcurrency);
        }
        Ok(Self { config })
    }

    /// Launch every column of `set`, never exceeding the concurrency cap,
    /// and return once all launched pipelines have fully drained.
    ///
    /// Fails on the first stage that exits non-zero, the first endpoint
    /// that cannot be opened, or the first process that cannot be spawned.
    /// Pipelines already running at that point are left running; there is
    /// no cancellation.
    pub async fn run(&self, set: &ColumnSet) -> Result<()> {
        let cap = self.config.concurrency;
        let mut in_flight: Vec<PipelineInstance> = Vec::new();
        let mut next_column = 0;

        while next_column < set.width() {
            // Make room for at least one more pipeline, then top up to the cap.
            drain_to(&mut in_flight, cap - 1).await?;
            while in_flight.len() < cap && next_column < set.width() {
                in_flight.push(build_pipeline(set, next_column, self.config.append)?);
                next_column += 1;
            }
        }

        // Everything is launched; wait for the stragglers.
        drain_to(&mut in_flight, 0).await
    }
}
