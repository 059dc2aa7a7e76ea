//! Supervised execution against real child processes.
#![cfg(unix)]

use std::time::{Duration, Instant};

use gradekit::{CommandRunner, Invocation, RunError, RunOptions};

fn quick() -> RunOptions {
    RunOptions::new().timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn normal_exit_is_not_a_crash() {
    let mut runner = CommandRunner::new();
    let r = runner
        .run(["sh", "-c", "echo out; echo err >&2; exit 3"], quick().name("exit3"))
        .await
        .unwrap();

    assert!(r.exited());
    assert!(!r.signaled());
    assert!(!r.timed_out());
    assert!(!r.crashed());
    assert_eq!(r.returncode(), Some(3));
    assert_eq!(r.disposition(), "Exited 3");
    assert_eq!(r.stdout(), b"out\n");
    assert_eq!(r.stderr(), b"err\n");
    assert_eq!(r.name(), Some("exit3"));
    assert!(!runner.crash_recorded());
}

#[tokio::test]
async fn input_is_fed_to_stdin() {
    let mut runner = CommandRunner::new();
    let r = runner
        .run(["cat"], quick().input("line one\nline two\n"))
        .await
        .unwrap();

    assert_eq!(r.stdout_lossy(), "line one\nline two\n");
    assert_eq!(r.stdin(), Some(&b"line one\nline two\n"[..]));
}

#[tokio::test]
async fn shell_string_runs_through_shell() {
    let mut runner = CommandRunner::new();
    let r = runner.run("echo $((1 + 2))", quick()).await.unwrap();

    assert_eq!(r.cmd(), "echo $((1 + 2))");
    assert_eq!(r.stdout_lossy(), "3\n");
    assert_eq!(r.returncode(), Some(0));
}

#[tokio::test]
async fn argv_command_line_is_quoted() {
    let mut runner = CommandRunner::new();
    let r = runner
        .run(["printf", "%s|", "a b", "c"], quick())
        .await
        .unwrap();

    assert_eq!(r.cmd(), "printf '%s|' 'a b' c");
    assert_eq!(r.stdout_lossy(), "a b|c|");
}

#[tokio::test]
async fn timeout_kills_and_sticks() {
    let mut runner = CommandRunner::new();
    let start = Instant::now();
    let r = runner
        .run("sleep 30", RunOptions::new().timeout(Duration::from_millis(200)))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(r.timed_out());
    assert!(r.crashed());
    assert!(!r.exited());
    assert_eq!(r.returncode(), None);
    assert!(r.disposition().contains("Timed Out"));
    assert_eq!(r.disposition(), "Timed Out (0.2s)");
    assert!(runner.crash_recorded());

    let ok = runner.run("true", quick()).await.unwrap();
    assert!(ok.exited());
    assert!(runner.crash_recorded());
}

#[tokio::test]
async fn timeout_reaches_the_whole_process_group() {
    let mut runner = CommandRunner::new();
    let start = Instant::now();
    // The background sleep inherits stdout; only a group kill closes the pipe.
    let r = runner
        .run(
            ["sh", "-c", "sleep 30 & echo started; wait"],
            RunOptions::new().timeout(Duration::from_millis(300)),
        )
        .await
        .unwrap();

    assert!(r.timed_out());
    assert_eq!(r.stdout_lossy(), "started\n");
    assert!(start.elapsed() < Duration::from_secs(3));
}

/// `true` while `pid` exists and is not a zombie.
fn process_alive(pid: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z')),
        Err(_) => false,
    }
}

#[tokio::test]
async fn background_descendant_is_killed_after_child_exits() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = CommandRunner::new();
    let start = Instant::now();
    let r = runner
        .run(
            ["sh", "-c", "sleep 30 & echo $! > bg.pid; echo hi"],
            RunOptions::new()
                .timeout(Duration::from_millis(500))
                .cwd(dir.path()),
        )
        .await
        .unwrap();

    // The command itself finished; only its leftover holds the pipes.
    assert!(r.exited());
    assert!(!r.timed_out());
    assert_eq!(r.returncode(), Some(0));
    assert_eq!(r.stdout_lossy(), "hi\n");
    assert!(!runner.crash_recorded());
    assert!(start.elapsed() < Duration::from_secs(3));

    let pid: i32 = std::fs::read_to_string(dir.path().join("bg.pid"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    let mut alive = process_alive(pid);
    for _ in 0..20 {
        if !alive {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        alive = process_alive(pid);
    }
    assert!(!alive, "background process {} outlived the run", pid);
}

#[tokio::test]
async fn signal_death_is_reported_by_name() {
    let mut runner = CommandRunner::new();
    let r = runner
        .run(["sh", "-c", "kill -TERM $$"], quick())
        .await
        .unwrap();

    assert!(r.signaled());
    assert!(r.crashed());
    assert!(!r.exited());
    assert_eq!(r.returncode(), Some(15));
    assert_eq!(r.raw_returncode(), Some(-15));
    assert_eq!(r.disposition(), "Signaled (SIGTERM)");
    assert!(runner.crash_recorded());
}

#[tokio::test]
async fn runners_do_not_share_crash_state() {
    let mut crashed = CommandRunner::new();
    let mut clean = CommandRunner::new();

    crashed
        .run("sleep 5", RunOptions::new().timeout(Duration::from_millis(100)))
        .await
        .unwrap();
    clean.run("true", quick()).await.unwrap();

    assert!(crashed.crash_recorded());
    assert!(!clean.crash_recorded());
}

#[tokio::test]
async fn spawn_failure_is_an_error() {
    let mut runner = CommandRunner::new();
    let err = runner
        .run(["/nonexistent/gradekit-prog"], quick())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Spawn { .. }));
    assert!(!runner.crash_recorded());
}

#[tokio::test]
async fn empty_argv_is_an_error() {
    let mut runner = CommandRunner::new();
    let err = runner
        .run(Invocation::Argv(vec![]), quick())
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::EmptyCommand));
}

#[tokio::test]
async fn empty_argv_is_rejected_before_provisioning() {
    let mut runner = CommandRunner::new();
    let err = runner
        .run(Invocation::Argv(vec![]), quick().user("bad name!"))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::EmptyCommand));
}

#[tokio::test]
async fn failed_provisioning_aborts_the_run() {
    let mut runner = CommandRunner::new();
    let err = runner
        .run("true", quick().user("bad name!"))
        .await
        .unwrap_err();

    // Spawn covers hosts without useradd.
    assert!(
        matches!(err, RunError::Provision { ref user, .. } if user == "bad name!")
            || matches!(err, RunError::Spawn { .. }),
        "unexpected error: {}",
        err
    );
    assert!(!runner.crash_recorded());
}

#[tokio::test]
async fn env_and_cwd_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = CommandRunner::new();
    let r = runner
        .run(
            "printf '%s:%s' \"$GRADEKIT_TEST\" \"$(basename \"$(pwd)\")\"",
            quick().env("GRADEKIT_TEST", "yes").cwd(dir.path()),
        )
        .await
        .unwrap();

    let expected = format!(
        "yes:{}",
        dir.path().file_name().unwrap().to_string_lossy()
    );
    assert_eq!(r.stdout_lossy(), expected);
}

#[test]
fn blocking_run_without_runtime() {
    let mut runner = CommandRunner::new();
    let r = runner.run_blocking(["sh", "-c", "exit 7"], quick()).unwrap();
    assert_eq!(r.returncode(), Some(7));
}

#[tokio::test]
async fn existing_user_skips_provisioning() {
    if !nix::unistd::geteuid().is_root() {
        return;
    }

    let mut runner = CommandRunner::new();
    let r = runner.run("id -u", quick().user("root")).await.unwrap();
    assert_eq!(r.stdout_lossy(), "0\n");
}
