// src/main.rs

//! gradekit
//!
//! Entry point for the gradekit CLI.
//!
//! Responsibilities of this file:
//! - Install logging
//! - Parse CLI arguments
//! - Hand off execution to the runner
//!
//! There is intentionally *no business logic* here.

use anyhow::Result;
use clap::Parser;

use gradekit::{cli, logging, runner};

/// Program entry point.
///
/// Uses Tokio because the runner supervises child processes
/// asynchronously (pipes, timeouts, kills).
#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = cli::Cli::parse();

    runner::run(cli).await
}
