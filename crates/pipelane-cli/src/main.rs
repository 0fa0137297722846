//! pipelane CLI entry point.
//!
//! Usage:
//!   pipelane <plan.json>               # run one pipeline at a time
//!   pipelane <plan.json> --jobs=4      # up to 4 pipelines in flight
//!   pipelane <plan.json> --append      # append to output files

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pipelane_kernel::{ColumnSet, Error, Runner, RunnerConfig, StageSpec};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    let mut plan_path: Option<String> = None;
    let mut config = RunnerConfig::default();

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(ExitCode::SUCCESS);
            }

            "--version" | "-V" => {
                println!("pipelane {}", env!("CARGO_PKG_VERSION"));
                return Ok(ExitCode::SUCCESS);
            }

            "--append" => config.append = true,

            arg if arg.starts_with("--jobs=") => {
                let value = &arg["--jobs=".len()..];
                config.concurrency = value
                    .parse()
                    .with_context(|| format!("invalid --jobs value: {value}"))?;
            }

            arg if !arg.starts_with('-') => {
                if plan_path.replace(arg.to_string()).is_some() {
                    anyhow::bail!("more than one plan file given");
                }
            }

            unknown => {
                eprintln!("Unknown option: {unknown}");
                eprintln!("Run 'pipelane --help' for usage.");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let Some(plan_path) = plan_path else {
        print_help();
        return Ok(ExitCode::FAILURE);
    };

    let set = load_plan(&plan_path)?;
    let runner = Runner::new(config).context("Invalid configuration")?;

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(runner.run(&set)) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("Error: {err}");
            // A failed stage decides the process exit code, like a shell.
            let code = match &err {
                Error::StageFailed { code, .. } => u8::try_from(*code).unwrap_or(1),
                _ => 1,
            };
            Ok(ExitCode::from(code))
        }
    }
}

/// Read and validate a plan document: a JSON array of stage rows.
fn load_plan(path: &str) -> Result<ColumnSet> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan: {path}"))?;
    let rows: Vec<Vec<StageSpec>> = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse plan: {path}"))?;
    let set = ColumnSet::new(rows).with_context(|| format!("Invalid plan: {path}"))?;
    Ok(set)
}

fn print_help() {
    println!(
        r#"pipelane v{} — bounded-concurrency pipeline runner

Usage:
  pipelane <plan.json> [OPTIONS]

Options:
  --jobs=<n>                   Pipelines to keep in flight (default: 1)
  --append                     Append to output files instead of truncating
  -h, --help                   Show this help
  -V, --version                Show version

The plan is a JSON array of stage rows; column j of every row, read top
to bottom, is one pipe-connected chain. The first row may hold input
endpoints and the last row output endpoints:

  [
    [{{"input": {{"file": "infile1"}}}},  {{"input": {{"file": "infile2"}}}}],
    [{{"command": {{"program": "grep", "args": ["CCACTACTT"]}}}},
     {{"command": {{"program": "grep", "args": ["CCACTACTT"]}}}}],
    [{{"command": {{"program": "fold", "args": ["-w", "10"]}}}},
     {{"command": {{"program": "fold", "args": ["-w", "10"]}}}}],
    [{{"output": {{"file": "outfile1"}}}}, {{"output": {{"file": "outfile2"}}}}]
  ]

Endpoints may also be "inherit" (share this process's stream) or, for
inputs, "null" (read nothing).

Examples:
  pipelane plan.json                   # one pipeline at a time
  pipelane plan.json --jobs=8          # up to 8 in flight
  RUST_LOG=debug pipelane plan.json    # show launch/drain events
"#,
        env!("CARGO_PKG_VERSION")
    );
}
