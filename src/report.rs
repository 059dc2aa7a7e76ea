// src/report.rs

//! The grading report: every test record plus report-level overrides.
//!
//! The exported shape is what the grading platform reads:
//!
//! ```json
//! {
//!   "tests": [ { "name": "...", "status": "passed", "score": 10, "max_score": 10 } ],
//!   "score": 10
//! }
//! ```
//!
//! Optional top-level keys (`execution_time`, `output`, `visibility`, ...)
//! only appear when set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::score::{Format, ScoreRecord, TestExport, Visibility};
use crate::util::ensure_dir;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub tests: Vec<ScoreRecord>,

    /// Replaces the computed total outright when set.
    pub score: Option<f64>,

    /// Seconds.
    pub execution_time: Option<f64>,

    pub output: Option<String>,
    pub output_format: Option<Format>,
    pub test_output_format: Option<Format>,
    pub test_name_format: Option<Format>,
    pub visibility: Option<Visibility>,
    pub stdout_visibility: Option<Visibility>,
    pub extra_data: Option<Value>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, test: ScoreRecord) {
        self.tests.push(test);
    }

    /// Sum of scores over records with a non-zero budget.
    pub fn computed_score(&self) -> f64 {
        self.tests
            .iter()
            .filter(|t| t.is_counted())
            .map(ScoreRecord::score)
            .sum()
    }

    pub fn total_score(&self) -> f64 {
        self.score.unwrap_or_else(|| self.computed_score())
    }

    pub fn export(&self) -> ReportExport {
        ReportExport {
            tests: self.tests.iter().map(ScoreRecord::export).collect(),
            score: self.total_score(),
            execution_time: self.execution_time,
            output: self.output.clone().filter(|s| !s.is_empty()),
            output_format: self.output_format,
            test_output_format: self.test_output_format,
            test_name_format: self.test_name_format,
            visibility: self.visibility,
            stdout_visibility: self.stdout_visibility,
            extra_data: self.extra_data.clone(),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.export()).context("Failed to serialize report JSON")
    }

    /// Write the exported report, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        std::fs::write(path, self.to_json_string()?)
            .with_context(|| format!("Failed to write report file {:?}", path))?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportExport {
    pub tests: Vec<TestExport>,
    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_output_format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name_format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_visibility: Option<Visibility>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Value>,
}
