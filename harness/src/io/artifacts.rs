//! Per-case failure artifacts.
//!
//! When a compile check fails, the candidate code and the filtered build log
//! are persisted so the repair workflow can pick them up later without
//! replaying the original conversation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

fn case_dir(artifacts_dir: &Path, case_id: &str) -> PathBuf {
    artifacts_dir.join(case_id)
}

fn buggy_code_path(artifacts_dir: &Path, case_id: &str) -> PathBuf {
    case_dir(artifacts_dir, case_id).join("buggy_code.java")
}

fn error_log_path(artifacts_dir: &Path, case_id: &str) -> PathBuf {
    case_dir(artifacts_dir, case_id).join("error_log.txt")
}

/// Persist the failing candidate and its build log.
pub fn write_failure(
    artifacts_dir: &Path,
    case_id: &str,
    buggy_code: &str,
    error_log: &str,
) -> Result<()> {
    let dir = case_dir(artifacts_dir, case_id);
    fs::create_dir_all(&dir).with_context(|| format!("create directory {}", dir.display()))?;
    fs::write(buggy_code_path(artifacts_dir, case_id), buggy_code)
        .with_context(|| format!("write buggy code for {case_id}"))?;
    fs::write(error_log_path(artifacts_dir, case_id), error_log)
        .with_context(|| format!("write error log for {case_id}"))?;
    debug!(case_id, "failure artifacts written");
    Ok(())
}

pub fn read_buggy_code(artifacts_dir: &Path, case_id: &str) -> Result<String> {
    let path = buggy_code_path(artifacts_dir, case_id);
    fs::read_to_string(&path).with_context(|| format!("read buggy code {}", path.display()))
}

pub fn read_error_log(artifacts_dir: &Path, case_id: &str) -> Result<String> {
    let path = error_log_path(artifacts_dir, case_id);
    fs::read_to_string(&path).with_context(|| format!("read error log {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_both_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_failure(temp.path(), "case-1", "class Broken {", "error: reached end of file")
            .expect("write");
        assert_eq!(
            read_buggy_code(temp.path(), "case-1").expect("code"),
            "class Broken {"
        );
        assert_eq!(
            read_error_log(temp.path(), "case-1").expect("log"),
            "error: reached end of file"
        );
    }

    #[test]
    fn missing_artifacts_are_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(read_buggy_code(temp.path(), "nope").is_err());
    }
}
