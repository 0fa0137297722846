//! Scheduling-semantics tests driving real OS processes through the runner.
//!
//! These cover the concurrency cap, launch accounting, sequential
//! execution under cap 1, and failure propagation with real exit codes.

use std::fs;
use std::time::{Duration, Instant};

use pipelane_kernel::{
    ColumnSet, CommandSpec, Error, InputSpec, OutputSpec, Runner, RunnerConfig, StageSpec,
};

fn cmd(program: &str, args: &[&str]) -> StageSpec {
    StageSpec::Command(CommandSpec::new(program, args.iter().copied()))
}

fn runner(concurrency: usize) -> Runner {
    Runner::new(RunnerConfig {
        concurrency,
        append: false,
    })
    .expect("valid config")
}

// ============================================================================
// Basic Execution
// ============================================================================

#[tokio::test]
async fn single_bare_command_runs() {
    // One column, one stage, no endpoint markers: a bare process sharing
    // the parent's stdin/stdout.
    let set = ColumnSet::new(vec![vec![cmd("true", &[])]]).unwrap();
    runner(1).run(&set).await.unwrap();
}

#[tokio::test]
async fn every_column_is_launched_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log");
    let script = format!("echo ok >> {}", log.display());
    let row: Vec<StageSpec> = (0..5).map(|_| cmd("sh", &["-c", &script])).collect();
    let set = ColumnSet::new(vec![row]).unwrap();

    runner(2).run(&set).await.unwrap();

    let lines = fs::read_to_string(&log).unwrap().lines().count();
    assert_eq!(lines, 5, "expected all 5 columns to run once each");
}

// ============================================================================
// Exit Codes and Failure Propagation
// ============================================================================

#[tokio::test]
async fn stage_failure_carries_the_exit_code() {
    let set = ColumnSet::new(vec![vec![cmd("sh", &["-c", "exit 42"])]]).unwrap();
    let err = runner(1).run(&set).await.unwrap_err();
    match err {
        Error::StageFailed {
            column,
            stage,
            program,
            code,
        } => {
            assert_eq!(column, 0);
            assert_eq!(stage, 0);
            assert_eq!(program, "sh");
            assert_eq!(code, 42);
        }
        other => panic!("expected StageFailed, got {other}"),
    }
}

#[tokio::test]
async fn exit_137_reports_137() {
    let set = ColumnSet::new(vec![vec![cmd("sh", &["-c", "exit 137"])]]).unwrap();
    let err = runner(1).run(&set).await.unwrap_err();
    assert!(matches!(err, Error::StageFailed { code: 137, .. }), "{err}");
}

#[tokio::test]
async fn fatal_signal_maps_to_shell_style_code() {
    // SIGKILL is signal 9; shells report 128 + 9 = 137.
    let set = ColumnSet::new(vec![vec![cmd("sh", &["-c", "kill -KILL $$"])]]).unwrap();
    let err = runner(1).run(&set).await.unwrap_err();
    assert!(matches!(err, Error::StageFailed { code: 137, .. }), "{err}");
}

#[tokio::test]
async fn failure_reported_while_other_pipelines_still_run() {
    // The failing column aborts the run even though its sibling is still
    // sleeping; the sleeper is left running, not waited for.
    let set = ColumnSet::new(vec![vec![
        cmd("sleep", &["5"]),
        cmd("sh", &["-c", "exit 3"]),
    ]])
    .unwrap();

    let started = Instant::now();
    let err = runner(2).run(&set).await.unwrap_err();

    assert!(
        matches!(
            err,
            Error::StageFailed {
                column: 1,
                code: 3,
                ..
            }
        ),
        "{err}"
    );
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "run must not wait for the sleeper after a failure"
    );
}

#[tokio::test]
async fn failing_interior_stage_aborts_the_run() {
    // cat | sh -c 'exit 7' | cat: the middle stage's code is reported.
    let set = ColumnSet::new(vec![
        vec![StageSpec::Input(InputSpec::Null)],
        vec![cmd("cat", &[])],
        vec![cmd("sh", &["-c", "exit 7"])],
        vec![cmd("cat", &[])],
        vec![StageSpec::Output(OutputSpec::Inherit)],
    ])
    .unwrap();

    let err = runner(1).run(&set).await.unwrap_err();
    assert!(
        matches!(err, Error::StageFailed { stage: 1, code: 7, .. }),
        "{err}"
    );
}

// ============================================================================
// Concurrency Cap
// ============================================================================

#[tokio::test]
async fn cap_bounds_the_in_flight_count() {
    // Four half-second sleeps under a cap of 2 cannot share a single
    // batch, so the run needs at least a full second end to end.
    let row: Vec<StageSpec> = (0..4).map(|_| cmd("sleep", &["0.5"])).collect();
    let set = ColumnSet::new(vec![row]).unwrap();

    let started = Instant::now();
    runner(2).run(&set).await.unwrap();

    assert!(
        started.elapsed() >= Duration::from_millis(950),
        "4 sleeps under cap 2 finished too fast: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn columns_run_in_parallel_up_to_the_cap() {
    // Three 0.6s sleeps under a cap of 3 run together; anywhere near the
    // 1.8s sequential time means the cap was not being used.
    let row: Vec<StageSpec> = (0..3).map(|_| cmd("sleep", &["0.6"])).collect();
    let set = ColumnSet::new(vec![row]).unwrap();

    let started = Instant::now();
    runner(3).run(&set).await.unwrap();

    assert!(
        started.elapsed() < Duration::from_millis(1500),
        "3 sleeps under cap 3 took {:?}",
        started.elapsed()
    );
}

// ============================================================================
// Sequential Execution (cap = 1)
// ============================================================================

#[tokio::test]
async fn cap_one_runs_columns_strictly_in_order() {
    // Column 0 writes a file that column 1 reads as its input endpoint.
    // Under cap 1 the second pipeline is only built after the first has
    // fully drained, so the handoff file must exist and be complete.
    let dir = tempfile::tempdir().unwrap();
    let handoff = dir.path().join("handoff");
    let result = dir.path().join("result");

    let set = ColumnSet::new(vec![
        vec![
            cmd("echo", &["hi"]),
            StageSpec::Input(InputSpec::File(handoff.clone())),
        ],
        vec![cmd("cat", &[]), cmd("cat", &[])],
        vec![
            StageSpec::Output(OutputSpec::File(handoff.clone())),
            StageSpec::Output(OutputSpec::File(result.clone())),
        ],
    ])
    .unwrap();

    runner(1).run(&set).await.unwrap();

    assert_eq!(fs::read_to_string(&result).unwrap(), "hi\n");
}
