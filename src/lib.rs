// src/lib.rs

//! gradekit
//!
//! Building blocks for autograders:
//! - [`score`]: validated per-test score records
//! - [`report`]: the aggregate grading report and its JSON export
//! - [`command`]: timeout-supervised command execution producing [`RunResult`]s
//!
//! The binary in `main.rs` wires these into a suite runner driven by
//! `grader.yaml`.

pub mod checks;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provision;
pub mod report;
pub mod result;
pub mod runner;
pub mod score;
pub mod suite;
pub mod util;

pub use command::{CommandRunner, Invocation, RunOptions};
pub use error::{RunError, ValidationError};
pub use report::{Report, ReportExport};
pub use result::RunResult;
pub use score::{Format, ScoreRecord, Scoring, Status, TestExport, Visibility};
