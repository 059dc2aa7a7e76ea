// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Autograder runner: execute test commands and emit a grading report.
///
/// `grader.yaml` is the primary source of truth.
/// CLI flags only override config values.
#[derive(Parser, Debug)]
#[command(name = "gradekit", version, disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every test in a suite file and write the report.
    Run {
        /// Path to suite file
        #[arg(short, long, default_value = "grader.yaml")]
        config: PathBuf,

        /// Override the results file (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the default per-test timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,
    },

    /// Run a single command and print a one-test report.
    ///
    /// The test passes when the command exits with status 0.
    ///
    /// Example:
    /// gradekit exec --name build --points 5 -- make all
    Exec {
        /// Test name shown in the report (defaults to the command line)
        #[arg(long)]
        name: Option<String>,

        /// Point budget
        #[arg(long)]
        points: Option<f64>,

        /// Timeout in seconds
        #[arg(long, default_value_t = 5.0)]
        timeout: f64,

        /// Join the arguments into one line and run it through the shell
        #[arg(long)]
        shell: bool,

        /// Command and arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },
}
