//! Refactoring-detection oracle adapter.
//!
//! The oracle is an external executable that compares before/after file
//! texts and reports whether the intended refactoring actually happened.
//! Candidate texts are persisted to scratch files; the verdict is the first
//! token of the last stdout line.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::types::{RefactoringKind, VerifyError};
use crate::io::process::run_with_timeout;

/// One detection check. `target` is present for dual-file kinds.
#[derive(Debug, Clone)]
pub struct OracleRequest<'a> {
    pub kind: RefactoringKind,
    /// Repo-relative origin file path, as the oracle resolves it.
    pub origin_path: &'a str,
    /// Origin file text before the refactoring.
    pub origin_before: &'a str,
    /// Candidate origin file text.
    pub origin_after: &'a str,
    pub target: Option<OracleTarget<'a>>,
}

#[derive(Debug, Clone)]
pub struct OracleTarget<'a> {
    pub target_path: &'a str,
    pub target_after: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleVerdict {
    pub detected: bool,
    pub report: String,
}

/// Seam for detection checks; tests script this.
pub trait Oracle {
    fn check(&self, request: &OracleRequest<'_>) -> Result<OracleVerdict>;
}

/// Real oracle: spawn the configured executable.
#[derive(Debug, Clone)]
pub struct CliOracle {
    command: Vec<String>,
    scratch_dir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CliOracle {
    pub fn new(
        command: Vec<String>,
        scratch_dir: impl Into<PathBuf>,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Self {
        Self {
            command,
            scratch_dir: scratch_dir.into(),
            timeout,
            output_limit_bytes,
        }
    }

    fn write_scratch(&self, name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.scratch_dir)
            .with_context(|| format!("create scratch dir {}", self.scratch_dir.display()))?;
        let path = self.scratch_dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("write scratch file {}", path.display()))?;
        Ok(path)
    }
}

impl Oracle for CliOracle {
    #[instrument(skip_all, fields(kind = %request.kind, dual = request.target.is_some()))]
    fn check(&self, request: &OracleRequest<'_>) -> Result<OracleVerdict> {
        let before = self.write_scratch("origin_before.java", request.origin_before)?;
        let after = self.write_scratch("origin_after.java", request.origin_after)?;

        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("oracle command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(leading);

        match &request.target {
            None => {
                cmd.arg("-scr")
                    .arg(request.origin_path)
                    .arg(&before)
                    .arg(&after)
                    .arg(request.kind.as_str());
            }
            Some(target) => {
                let target_after = self.write_scratch("target_after.java", target.target_after)?;
                cmd.arg("-spr")
                    .arg(request.origin_path)
                    .arg(&after)
                    .arg(target.target_path)
                    .arg(&target_after)
                    .arg(request.kind.as_str());
            }
        }

        let out = run_with_timeout(cmd, None, self.timeout, self.output_limit_bytes)
            .context("run refactoring oracle")?;
        if !out.success() {
            let detail = if out.timed_out {
                "timed out".to_string()
            } else {
                format!(
                    "exit code {:?}: {}",
                    out.status.code(),
                    out.stderr_text().trim()
                )
            };
            return Err(anyhow::Error::new(VerifyError::OracleExecutionFailed(
                detail,
            )));
        }

        let stdout = out.stdout_text();
        let detected = parse_verdict(&stdout);
        debug!(detected, "oracle finished");
        Ok(OracleVerdict {
            detected,
            report: verdict_report(request.kind, detected),
        })
    }
}

/// The oracle prints diagnostics followed by a final verdict line whose
/// first token is `true` or `false`.
pub fn parse_verdict(stdout: &str) -> bool {
    stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.split_whitespace().next())
        .map(|token| token == "true")
        .unwrap_or(false)
}

pub fn verdict_report(kind: RefactoringKind, detected: bool) -> String {
    if detected {
        format!("the {kind} operation was performed correctly")
    } else {
        format!("the code change does not perform a {kind} operation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted_oracle(temp: &tempfile::TempDir, script: &str) -> CliOracle {
        let script_path = temp.path().join("oracle.sh");
        fs::write(&script_path, script).expect("write script");
        CliOracle::new(
            vec![
                "sh".to_string(),
                script_path.to_string_lossy().into_owned(),
            ],
            temp.path().join("scratch"),
            Duration::from_secs(5),
            16 * 1024,
        )
    }

    fn request(kind: RefactoringKind) -> OracleRequest<'static> {
        OracleRequest {
            kind,
            origin_path: "src/main/java/Widget.java",
            origin_before: "class Widget { int area() { return 0; } }",
            origin_after: "class Widget { int area() { return Geometry.area(); } }",
            target: None,
        }
    }

    #[test]
    fn verdict_is_first_token_of_last_line() {
        assert!(parse_verdict("scanning...\ntrue Extract Method at Widget.java\n"));
        assert!(!parse_verdict("scanning...\nfalse nothing detected\n"));
        assert!(!parse_verdict("truthy output\n"));
        assert!(!parse_verdict(""));
    }

    #[test]
    fn detected_verdict_round_trips_through_the_cli() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = scripted_oracle(&temp, "echo 'comparing files'\necho 'true detected'\n");
        let verdict = oracle
            .check(&request(RefactoringKind::ExtractMethod))
            .expect("check");
        assert!(verdict.detected);
        assert!(verdict.report.contains("Extract Method"));
    }

    #[test]
    fn scratch_files_carry_the_candidate_texts() {
        let temp = tempfile::tempdir().expect("tempdir");
        // The script fails unless the after-file contains the candidate text.
        let script = "grep -q 'Geometry.area' \"$4\" && echo true || echo false\n";
        let oracle = scripted_oracle(&temp, script);
        let verdict = oracle
            .check(&request(RefactoringKind::ExtractMethod))
            .expect("check");
        assert!(verdict.detected);
    }

    #[test]
    fn nonzero_exit_is_an_execution_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let oracle = scripted_oracle(&temp, "echo boom >&2\nexit 3\n");
        let err = oracle
            .check(&request(RefactoringKind::MoveMethod))
            .unwrap_err();
        let verify_err = err
            .downcast_ref::<VerifyError>()
            .expect("typed oracle error");
        assert!(matches!(verify_err, VerifyError::OracleExecutionFailed(_)));
    }
}
