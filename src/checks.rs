// src/checks.rs

//! Expectations evaluated against a finished [`RunResult`].
//!
//! A crashed run (signal or timeout) always fails. Everything else is
//! opt-in: each field of [`Expect`] that is set adds one check.
//!
//! Checks never short-circuit; every failure is reported so the student
//! sees all of them at once.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::result::RunResult;

/// Expected outcome of a test command.
///
/// Example in grader.yaml:
///
/// expect:
///   exit_code: 0
///   stdout_contains: "sum = 42"
///   stderr_empty: true
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Expect {
    /// Required exit code. Defaults to 0 when no other expectation is set.
    #[serde(default)]
    pub exit_code: Option<i32>,

    #[serde(default)]
    pub stdout_contains: Option<String>,

    #[serde(default)]
    pub stdout_regex: Option<String>,

    #[serde(default)]
    pub stderr_empty: bool,
}

impl Expect {
    fn is_empty(&self) -> bool {
        self.exit_code.is_none()
            && self.stdout_contains.is_none()
            && self.stdout_regex.is_none()
            && !self.stderr_empty
    }

    /// Compile the regex up front so a bad pattern is a config error,
    /// not a failing test.
    pub fn compile(&self) -> Result<CompiledExpect<'_>> {
        let stdout_regex = match &self.stdout_regex {
            Some(pattern) => Some(
                Regex::new(pattern)
                    .with_context(|| format!("Invalid stdout_regex `{}`", pattern))?,
            ),
            None => None,
        };

        Ok(CompiledExpect {
            expect: self,
            stdout_regex,
        })
    }
}

pub struct CompiledExpect<'a> {
    expect: &'a Expect,
    stdout_regex: Option<Regex>,
}

impl CompiledExpect<'_> {
    /// All failure messages for `result`; empty means the test passed.
    pub fn evaluate(&self, result: &RunResult) -> Vec<String> {
        let mut failures = Vec::new();

        if result.crashed() {
            failures.push(format!("Command crashed: {}", result.disposition()));
            return failures;
        }

        let expected_code = match self.expect.exit_code {
            Some(code) => Some(code),
            None if self.expect.is_empty() => Some(0),
            None => None,
        };
        if let Some(expected) = expected_code {
            if result.returncode() != Some(expected) {
                failures.push(format!(
                    "Expected exit code {}, got {}",
                    expected,
                    result.disposition()
                ));
            }
        }

        let stdout = result.stdout_lossy();

        if let Some(needle) = &self.expect.stdout_contains {
            if !stdout.contains(needle.as_str()) {
                failures.push(format!("stdout does not contain {:?}", needle));
            }
        }

        if let Some(re) = &self.stdout_regex {
            if !re.is_match(&stdout) {
                failures.push(format!("stdout does not match /{}/", re.as_str()));
            }
        }

        if self.expect.stderr_empty && !result.stderr().is_empty() {
            failures.push(format!(
                "Expected empty stderr, got {} bytes",
                result.stderr().len()
            ));
        }

        failures
    }
}
