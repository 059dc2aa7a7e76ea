// src/result.rs

//! Outcome of one supervised command invocation.
//!
//! Return code encoding (the raw code):
//! - `None`: timed out and killed
//! - negative: terminated by signal `-code`
//! - zero or positive: normal exit code

use std::borrow::Cow;
use std::time::Duration;

/// Immutable record of a finished invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    name: Option<String>,
    cmd: String,
    stdin: Option<Vec<u8>>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    code: Option<i32>,
    timeout: Duration,
    elapsed: Duration,
    max_rss_kb: Option<u64>,
}

/// Everything the runner observed, handed to [`RunResult::new`].
#[derive(Debug, Clone, Default)]
pub struct RunParts {
    pub name: Option<String>,
    pub cmd: String,
    pub stdin: Option<Vec<u8>>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub code: Option<i32>,
    pub timeout: Duration,
    pub elapsed: Duration,
    pub max_rss_kb: Option<u64>,
}

impl RunResult {
    pub fn new(parts: RunParts) -> Self {
        Self {
            name: parts.name,
            cmd: parts.cmd,
            stdin: parts.stdin,
            stdout: parts.stdout,
            stderr: parts.stderr,
            code: parts.code,
            timeout: parts.timeout,
            elapsed: parts.elapsed,
            max_rss_kb: parts.max_rss_kb,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Human-readable command line.
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Peak resident memory of the child in KB, when it could be sampled.
    pub fn max_rss_kb(&self) -> Option<u64> {
        self.max_rss_kb
    }

    /// Signed return code as described in the module docs.
    pub fn raw_returncode(&self) -> Option<i32> {
        self.code
    }

    /// Exit code or signal number; `None` on timeout.
    pub fn returncode(&self) -> Option<i32> {
        self.code.map(i32::abs)
    }

    pub fn exited(&self) -> bool {
        matches!(self.code, Some(c) if c >= 0)
    }

    pub fn signaled(&self) -> bool {
        matches!(self.code, Some(c) if c < 0)
    }

    pub fn timed_out(&self) -> bool {
        self.code.is_none()
    }

    pub fn crashed(&self) -> bool {
        self.signaled() || self.timed_out()
    }

    /// One-line classification: `Timed Out (5s)`, `Signaled (SIGSEGV)`
    /// or `Exited 1`.
    pub fn disposition(&self) -> String {
        match self.code {
            None => format!("Timed Out ({}s)", self.timeout.as_secs_f64()),
            Some(c) if c < 0 => format!("Signaled ({})", signal_name(-c)),
            Some(c) => format!("Exited {}", c),
        }
    }
}

#[cfg(unix)]
pub fn signal_name(signum: i32) -> String {
    match nix::sys::signal::Signal::try_from(signum) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("signal {}", signum),
    }
}

#[cfg(not(unix))]
pub fn signal_name(signum: i32) -> String {
    format!("signal {}", signum)
}
