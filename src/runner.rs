// src/runner.rs

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::{Cli, Command};
use crate::command::{CommandRunner, Invocation, RunOptions};
use crate::config::{parse_timeout_secs, SuiteConfig};
use crate::report::Report;
use crate::score::ScoreRecord;
use crate::suite::{describe, run_suite};
use crate::util::resolve_relative_to_config;

/// Entry point from `main.rs`.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            config,
            output,
            timeout,
        } => {
            let mut cfg = SuiteConfig::load(&config)?;

            // CLI overrides
            if let Some(t) = timeout {
                parse_timeout_secs(t).context("Invalid --timeout")?;
                cfg.timeout_secs = t;
            }
            let destination = match output {
                Some(path) => Some(path),
                None => cfg
                    .output
                    .file
                    .as_deref()
                    .map(|f| resolve_relative_to_config(&config, f))
                    .transpose()?,
            };

            let report = run_suite(&cfg).await?;
            emit(&report, destination.as_deref())
        }

        Command::Exec {
            name,
            points,
            timeout,
            shell,
            command,
        } => {
            let timeout = parse_timeout_secs(timeout).context("Invalid --timeout")?;
            let invocation = if shell {
                Invocation::Shell(command.join(" "))
            } else {
                Invocation::Argv(command)
            };
            let name = name.unwrap_or_else(|| invocation.display());

            let mut runner = CommandRunner::new();
            let result = runner
                .run(
                    invocation,
                    RunOptions::new().name(name.clone()).timeout(timeout),
                )
                .await?;

            let mut record = ScoreRecord::with_budget(name, points, None)?;
            record.set_passing(result.returncode() == Some(0) && result.exited());
            record.set_output(describe(&result, &[]));

            let mut report = Report::new();
            report.execution_time = Some(result.elapsed().as_secs_f64());
            report.extra_data = Some(serde_json::json!({ "crashed": runner.crash_recorded() }));
            report.push(record);
            emit(&report, None)
        }
    }
}

/// Print the report to stdout or write it to `destination`.
fn emit(report: &Report, destination: Option<&Path>) -> Result<()> {
    match destination {
        Some(path) if path != Path::new("-") => {
            report.write_json(path)?;
            tracing::info!("Wrote report to {}", path.display());
            Ok(())
        }
        _ => {
            let json = report.to_json_string().context("Failed to render report")?;
            println!("{}", json);
            Ok(())
        }
    }
}
