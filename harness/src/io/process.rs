//! Child-process execution with timeouts and bounded capture.
//!
//! Every external tool this harness talks to (git, gradle, jenv, the oracle,
//! the agent backend) goes through here, so a hung build or a chatty log can
//! never wedge or balloon a run.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of one child process.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes discarded beyond the capture limit (stdout + stderr).
    pub dropped_bytes: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success() && !self.timed_out
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// One-line suffix to append to logs when capture was truncated.
    pub fn truncation_notice(&self) -> String {
        if self.dropped_bytes > 0 {
            format!("\n[output truncated, {} bytes dropped]", self.dropped_bytes)
        } else {
            String::new()
        }
    }
}

/// Run `cmd` to completion, killing it after `timeout`.
///
/// Both pipes are drained concurrently so a full pipe can never deadlock the
/// child; at most `output_limit_bytes` of each stream is kept in memory.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs()))]
pub fn run_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn command")?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let out_reader = thread::spawn(move || drain_limited(stdout, output_limit_bytes));
    let err_reader = thread::spawn(move || drain_limited(stderr, output_limit_bytes));

    // Readers are running, so a child that talks while we feed it cannot
    // fill a pipe and deadlock.
    if let Some(input) = stdin {
        let mut pipe = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        pipe.write_all(input).context("write stdin")?;
    }

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, out_dropped) = join_reader(out_reader)?;
    let (stderr, err_dropped) = join_reader(err_reader)?;
    let dropped_bytes = out_dropped + err_dropped;
    if dropped_bytes > 0 {
        warn!(dropped_bytes, "command output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        dropped_bytes,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}

/// Drain a pipe to EOF, keeping only the first `limit` bytes.
fn drain_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            return Ok((kept, dropped));
        }
        let room = limit.saturating_sub(kept.len());
        let take = n.min(room);
        kept.extend_from_slice(&chunk[..take]);
        dropped += n - take;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams() {
        let out = run_with_timeout(
            sh("echo out; echo err >&2"),
            None,
            Duration::from_secs(5),
            4096,
        )
        .expect("run");
        assert!(out.success());
        assert_eq!(out.stdout_text().trim(), "out");
        assert_eq!(out.stderr_text().trim(), "err");
    }

    #[test]
    fn enforces_the_capture_limit() {
        let out = run_with_timeout(
            sh("yes x | head -c 100000"),
            None,
            Duration::from_secs(10),
            1000,
        )
        .expect("run");
        assert_eq!(out.stdout.len(), 1000);
        assert!(out.dropped_bytes >= 99_000);
        assert!(!out.truncation_notice().is_empty());
    }

    #[test]
    fn kills_on_timeout() {
        let out = run_with_timeout(sh("sleep 30"), None, Duration::from_millis(200), 4096)
            .expect("run");
        assert!(out.timed_out);
        assert!(!out.success());
    }

    #[test]
    fn feeds_stdin() {
        let out = run_with_timeout(sh("cat"), Some(b"ping"), Duration::from_secs(5), 4096)
            .expect("run");
        assert_eq!(out.stdout_text(), "ping");
    }
}
