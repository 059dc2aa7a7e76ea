// src/command.rs

//! Timeout-supervised execution of a single external command.
//!
//! Each [`CommandRunner::run`] call is one full cycle:
//! launch → feed stdin → wait (bounded) → kill on timeout → reap → report.
//!
//! The child is placed in its own process group so that a timeout kill
//! reaches everything it spawned. Shell commands are launched as
//! `sh -c "exec <cmd>"` so the shell is replaced by the command itself.
//!
//! A crash (signal or timeout) is never an error here. It is recorded in
//! the returned [`RunResult`] and in the runner's sticky crash flag.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStderr, ChildStdout, Command as TokioCommand};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::RunError;
use crate::metrics::{PeakRssSampler, SAMPLE_EVERY};
use crate::provision::ensure_user;
use crate::result::{RunParts, RunResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on collecting output after a timeout kill.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/* ---------------- invocation ---------------- */

/// What to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Raw command line run through `sh -c "exec ..."`.
    Shell(String),
    /// Program and arguments, executed directly.
    Argv(Vec<String>),
}

impl Invocation {
    /// Command line as shown in logs and results.
    ///
    /// Argument lists are re-joined with shell-safe quoting.
    pub fn display(&self) -> String {
        match self {
            Invocation::Shell(line) => line.clone(),
            Invocation::Argv(args) => args
                .iter()
                .map(|a| shell_escape::unix::escape(Cow::from(a.as_str())).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn build(&self) -> Result<(TokioCommand, String), RunError> {
        match self {
            Invocation::Shell(line) => {
                let script = format!("exec {}", line);
                let mut cmd = TokioCommand::new("sh");
                cmd.arg("-c").arg(&script);
                Ok((cmd, script))
            }
            Invocation::Argv(args) => {
                let (program, rest) = args.split_first().ok_or(RunError::EmptyCommand)?;
                let mut cmd = TokioCommand::new(program);
                cmd.args(rest);
                Ok((cmd, self.display()))
            }
        }
    }
}

impl From<&str> for Invocation {
    fn from(line: &str) -> Self {
        Invocation::Shell(line.to_string())
    }
}

impl From<String> for Invocation {
    fn from(line: String) -> Self {
        Invocation::Shell(line)
    }
}

impl From<Vec<String>> for Invocation {
    fn from(args: Vec<String>) -> Self {
        Invocation::Argv(args)
    }
}

impl From<&[&str]> for Invocation {
    fn from(args: &[&str]) -> Self {
        Invocation::Argv(args.iter().map(|a| a.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Invocation {
    fn from(args: [&str; N]) -> Self {
        Invocation::Argv(args.iter().map(|a| a.to_string()).collect())
    }
}

/* ---------------- options ---------------- */

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub name: Option<String>,
    pub timeout: Duration,
    pub input: Option<Vec<u8>>,
    /// Run as this OS account, creating it if needed.
    pub user: Option<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            name: None,
            timeout: DEFAULT_TIMEOUT,
            input: None,
            user: None,
            env: BTreeMap::new(),
            cwd: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fractional-second timeout. Values too large for a `Duration`
    /// saturate instead of panicking.
    pub fn timeout_secs(self, secs: f64) -> Self {
        let timeout = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX);
        self.timeout(timeout)
    }

    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/* ---------------- runner ---------------- */

/// Runs commands one at a time and remembers whether any of them crashed.
#[derive(Debug, Default)]
pub struct CommandRunner {
    crash_recorded: bool,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once any invocation by this runner was signaled or timed out.
    pub fn crash_recorded(&self) -> bool {
        self.crash_recorded
    }

    /// Run `command` to completion or until `opts.timeout` expires.
    ///
    /// Only launch problems (empty command, spawn failure, failed account
    /// provisioning) are errors.
    pub async fn run(
        &mut self,
        command: impl Into<Invocation>,
        opts: RunOptions,
    ) -> Result<RunResult, RunError> {
        let invocation = command.into();
        let cmdline = invocation.display();
        let (mut cmd, launch_line) = invocation.build()?;

        let identity = match &opts.user {
            Some(user) => Some(ensure_user(user).await?),
            None => None,
        };

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (k, v) in &opts.env {
            cmd.env(k, v);
        }
        if let Some(dir) = &opts.cwd {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        {
            cmd.process_group(0);
            if let Some(id) = identity {
                cmd.uid(id.uid).gid(id.gid);
            }
        }
        #[cfg(not(unix))]
        let _ = identity;

        info!("Running {}", launch_line);
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
            command: launch_line.clone(),
            source,
        })?;

        // The child leads its own group; the id stays valid as the group id
        // after the child itself has been reaped.
        let pgid = child.id();
        let sampler = pgid.map(|pid| PeakRssSampler::start(pid, SAMPLE_EVERY));

        let mut output_task = spawn_output_reader(child.stdout.take(), child.stderr.take());
        let mut stdin_task = spawn_writer(child.stdin.take(), opts.input.clone());

        let status = match timeout(opts.timeout, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => None,
        };

        // Descendants may still hold the pipes after the child exits, so
        // collecting output shares the same deadline.
        let collected = match status {
            Some(_) => {
                let remaining = opts.timeout.saturating_sub(start.elapsed());
                timeout(remaining, async {
                    let _ = (&mut stdin_task).await;
                    join_output(&mut output_task).await
                })
                .await
                .ok()
            }
            None => None,
        };

        let (stdout, stderr) = match collected {
            Some(pair) => pair,
            None => {
                kill_group(pgid);
                if status.is_none() {
                    if let Err(e) = child.kill().await {
                        debug!("kill after timeout failed: {}", e);
                    }
                } else {
                    debug!("process group still held output pipes at deadline");
                }
                stdin_task.abort();
                drain(output_task).await
            }
        };
        let code = status.map(encode_status);

        let elapsed = start.elapsed();
        let max_rss_kb = sampler.and_then(PeakRssSampler::finish);

        if code.map_or(true, |c| c < 0) {
            warn!(returncode = ?code, "Crashed -- {}", cmdline);
            self.crash_recorded = true;
        }

        Ok(RunResult::new(RunParts {
            name: opts.name,
            cmd: cmdline,
            stdin: opts.input,
            stdout,
            stderr,
            code,
            timeout: opts.timeout,
            elapsed,
            max_rss_kb,
        }))
    }

    /// Blocking form of [`run`](Self::run) for callers without a runtime.
    pub fn run_blocking(
        &mut self,
        command: impl Into<Invocation>,
        opts: RunOptions,
    ) -> Result<RunResult, RunError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.run(command, opts))
    }
}

/* ---------------- helpers ---------------- */

type OutputTask = JoinHandle<(Vec<u8>, Vec<u8>)>;

/// Read stdout and stderr concurrently until both reach EOF.
fn spawn_output_reader(stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> OutputTask {
    tokio::spawn(async move { tokio::join!(read_pipe(stdout), read_pipe(stderr)) })
}

async fn read_pipe<R>(pipe: Option<R>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("output pipe read failed: {}", e);
        }
    }
    buf
}

fn spawn_writer(
    pipe: Option<tokio::process::ChildStdin>,
    input: Option<Vec<u8>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Dropping the pipe closes the child's stdin.
        let (Some(mut pipe), Some(input)) = (pipe, input) else {
            return;
        };
        if let Err(e) = pipe.write_all(&input).await {
            debug!("stdin write stopped early: {}", e);
        }
    })
}

async fn join_output(task: &mut OutputTask) -> (Vec<u8>, Vec<u8>) {
    match task.await {
        Ok(pair) => pair,
        Err(e) => {
            debug!("output reader task failed: {}", e);
            (Vec::new(), Vec::new())
        }
    }
}

/// Collect whatever output is left after a kill, giving up after
/// [`DRAIN_TIMEOUT`].
async fn drain(mut task: OutputTask) -> (Vec<u8>, Vec<u8>) {
    match timeout(DRAIN_TIMEOUT, join_output(&mut task)).await {
        Ok(pair) => pair,
        Err(_) => {
            debug!("output drain timed out");
            task.abort();
            (Vec::new(), Vec::new())
        }
    }
}

/// SIGKILL every process in the child's group.
fn kill_group(pgid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pgid {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Ok(raw) = i32::try_from(pid) {
            if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
                debug!("killpg({}) failed: {}", pid, e);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;
}

/// Exit code, or the negated signal number for signal deaths.
fn encode_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return -sig;
        }
    }

    -1
}
