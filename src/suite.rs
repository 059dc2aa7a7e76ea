// src/suite.rs

//! Suite execution: run every configured test command and grade it.
//!
//! All tests share one [`CommandRunner`], so the report's
//! `extra_data.crashed` flag says whether anything crashed during the
//! whole suite.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::time::Instant;
use tracing::info;

use crate::command::{CommandRunner, RunOptions};
use crate::config::{parse_timeout_secs, SuiteConfig, TestSpec};
use crate::report::Report;
use crate::result::RunResult;
use crate::score::ScoreRecord;

/// Run all tests in `cfg` and build the report.
///
/// Failing tests are data. Only configuration, launch and provisioning
/// problems return `Err`.
pub async fn run_suite(cfg: &SuiteConfig) -> Result<Report> {
    let mut runner = CommandRunner::new();
    let mut report = Report::new();
    let start = Instant::now();

    for test in &cfg.tests {
        let record = run_test(&mut runner, cfg, test).await?;
        info!(
            test = record.name(),
            status = ?record.status(),
            "graded"
        );
        report.push(record);
    }

    let settings = &cfg.report;
    report.score = settings.score;
    report.execution_time = Some(start.elapsed().as_secs_f64());
    report.output = settings.output.clone();
    report.output_format = settings.output_format;
    report.test_output_format = settings.test_output_format;
    report.test_name_format = settings.test_name_format;
    report.visibility = settings.visibility;
    report.stdout_visibility = settings.stdout_visibility;
    report.extra_data = Some(serde_json::json!({ "crashed": runner.crash_recorded() }));

    Ok(report)
}

async fn run_test(
    runner: &mut CommandRunner,
    cfg: &SuiteConfig,
    test: &TestSpec,
) -> Result<ScoreRecord> {
    let expect = test
        .expect
        .compile()
        .with_context(|| format!("Test `{}` has invalid expectations", test.name))?;

    let timeout = parse_timeout_secs(test.timeout_secs.unwrap_or(cfg.timeout_secs))
        .with_context(|| format!("Test `{}` has an invalid timeout", test.name))?;

    let mut opts = RunOptions::new().name(test.name.clone()).timeout(timeout);
    if let Some(input) = &test.input {
        opts = opts.input(input.as_bytes());
    }
    if let Some(user) = &test.user {
        opts = opts.user(user.clone());
    }
    for (k, v) in cfg.env.iter().chain(test.env.iter()) {
        opts = opts.env(k.clone(), v.clone());
    }

    let result = runner
        .run(test.command.clone(), opts)
        .await
        .with_context(|| format!("Test `{}` could not be run", test.name))?;

    let failures = expect.evaluate(&result);

    let mut record = ScoreRecord::with_budget(test.name.clone(), test.points, None)
        .with_context(|| format!("Test `{}` has an invalid score setup", test.name))?;
    record.set_passing(failures.is_empty());
    record.set_visibility(test.visibility);
    record.set_name_format(test.name_format);
    record.set_output_format(test.output_format);
    record.set_output(describe(&result, &failures));

    Ok(record)
}

/// Plain-text summary written into a test's `output`.
pub fn describe(result: &RunResult, failures: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "$ {}", result.cmd());
    let _ = writeln!(out, "status: {}", result.disposition());
    let _ = writeln!(out, "time: {}ms", result.elapsed().as_millis());

    if !failures.is_empty() {
        out.push_str("failures:\n");
        for f in failures {
            let _ = writeln!(out, "- {}", f);
        }
    }

    out.trim_end().to_string()
}
