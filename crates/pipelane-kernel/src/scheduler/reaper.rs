//! Completion reaping: poll in-flight pipelines down to a target count.

use std::process::ExitStatus;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::scheduler::builder::PipelineInstance;

/// Delay between polling passes. A courtesy to the CPU only; the drain
/// contract does not depend on it.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Block until at most `target` pipelines remain in flight.
///
/// Each pass polls every stage of every pipeline: a stage that exited with
/// status 0 is removed from its pipeline, and a pipeline whose stage list
/// empties is dropped from the set. The first non-zero exit fails the
/// whole drain; sibling processes are left running.
pub(crate) async fn drain_to(
    in_flight: &mut Vec<PipelineInstance>,
    target: usize,
) -> Result<()> {
    if in_flight.len() > target {
        tracing::debug!(in_flight = in_flight.len(), target, "draining pipelines");
    }

    while in_flight.len() > target {
        for pipeline in in_flight.iter_mut() {
            // Reverse order so removals do not disturb the indices still
            // to be visited.
            for index in (0..pipeline.stages.len()).rev() {
                match pipeline.stages[index].child.try_wait() {
                    Ok(None) => {}
                    Ok(Some(status)) if status.success() => {
                        let done = pipeline.stages.remove(index);
                        tracing::debug!(
                            column = done.column,
                            stage = done.stage,
                            program = %done.program,
                            "stage completed"
                        );
                    }
                    Ok(Some(status)) => {
                        let failed = &pipeline.stages[index];
                        return Err(Error::StageFailed {
                            column: failed.column,
                            stage: failed.stage,
                            program: failed.program.clone(),
                            code: exit_code(status),
                        });
                    }
                    Err(source) => {
                        let failed = &pipeline.stages[index];
                        return Err(Error::Poll {
                            column: failed.column,
                            stage: failed.stage,
                            program: failed.program.clone(),
                            source,
                        });
                    }
                }
            }
        }

        in_flight.retain(|pipeline| {
            if pipeline.stages.is_empty() {
                tracing::debug!(column = pipeline.column, "pipeline drained");
                false
            } else {
                true
            }
        });

        if in_flight.len() > target {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    Ok(())
}

/// Fold an exit status into a single code, mapping fatal signals to the
/// conventional 128+N form.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(-1)
}
