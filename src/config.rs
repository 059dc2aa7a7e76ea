// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path, time::Duration};

use crate::checks::Expect;
use crate::command::Invocation;
use crate::score::{Format, Visibility};
use crate::util::read_to_string;

/// Root configuration loaded from `grader.yaml`.
///
/// This file controls:
/// - Which test commands run, and how many points each is worth
/// - What each command is expected to do
/// - Report-level settings passed through to the grading platform
/// - Where the results file is written
///
/// Example:
///
/// timeout_secs: 5
/// tests:
///   - name: compiles
///     command: make
///   - name: sums correctly
///     command: ["./sum", "1", "2"]
///     points: 10
///     expect:
///       stdout_contains: "3"
/// output:
///   file: results/results.json
#[derive(Debug, Deserialize)]
pub struct SuiteConfig {
    pub tests: Vec<TestSpec>,

    /// Default timeout for tests that do not set their own.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Environment variables injected into every test command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub report: ReportSettings,

    #[serde(default)]
    pub output: OutputConfig,
}

/// One test command.
#[derive(Debug, Deserialize)]
pub struct TestSpec {
    pub name: String,

    /// A string runs through the shell; a list runs directly.
    pub command: CommandSpec,

    /// Point budget. Omitted or 0 means pass/fail only.
    #[serde(default)]
    pub points: Option<f64>,

    #[serde(default)]
    pub timeout_secs: Option<f64>,

    /// Text fed to the command's stdin.
    #[serde(default)]
    pub input: Option<String>,

    /// Run as this OS account (created if missing).
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub visibility: Option<Visibility>,

    #[serde(default)]
    pub name_format: Option<Format>,

    #[serde(default)]
    pub output_format: Option<Format>,

    #[serde(default)]
    pub expect: Expect,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Args(Vec<String>),
}

impl From<CommandSpec> for Invocation {
    fn from(spec: CommandSpec) -> Self {
        match spec {
            CommandSpec::Line(line) => Invocation::Shell(line),
            CommandSpec::Args(args) => Invocation::Argv(args),
        }
    }
}

/// Report-level settings copied onto the exported report.
#[derive(Debug, Default, Deserialize)]
pub struct ReportSettings {
    /// Replaces the computed total when set.
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub output_format: Option<Format>,

    #[serde(default)]
    pub test_output_format: Option<Format>,

    #[serde(default)]
    pub test_name_format: Option<Format>,

    #[serde(default)]
    pub visibility: Option<Visibility>,

    #[serde(default)]
    pub stdout_visibility: Option<Visibility>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Results file. The report goes to stdout when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_timeout_secs() -> f64 {
    5.0
}

/// Convert a user-supplied timeout in seconds, rejecting values that are
/// not positive or do not fit a `Duration`.
pub fn parse_timeout_secs(secs: f64) -> Result<Duration> {
    if secs.is_nan() || secs <= 0.0 {
        bail!("timeout must be a positive number of seconds, got {}", secs);
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("timeout of {} seconds is out of range", secs))
}

impl SuiteConfig {
    /// Load and parse `grader.yaml` from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let cfg: SuiteConfig = serde_yaml::from_str(raw).context("Failed to parse YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        parse_timeout_secs(self.timeout_secs).context("Invalid timeout_secs")?;

        for test in &self.tests {
            if test.name.is_empty() {
                bail!("Every test needs a non-empty name");
            }
            if let CommandSpec::Args(args) = &test.command {
                if args.is_empty() {
                    bail!("Test `{}` has an empty command list", test.name);
                }
            }
            if let Some(t) = test.timeout_secs {
                parse_timeout_secs(t)
                    .with_context(|| format!("Test `{}`: invalid timeout_secs", test.name))?;
            }
        }

        Ok(())
    }
}
