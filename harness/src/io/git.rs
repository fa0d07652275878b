//! Git adapter for positioning the experiment project at dataset commits.
//!
//! Compile checks run against the project tree as it looked one commit
//! before the recorded refactoring, so the wrapper stays small and explicit.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Wrapper for executing git commands in a project checkout.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Force the worktree onto `commit`, discarding local edits from the
    /// previous case.
    #[instrument(skip_all, fields(commit))]
    pub fn force_checkout(&self, commit: &str) -> Result<()> {
        self.run_checked(&["reset", "--hard"])?;
        self.run_checked(&["checkout", "-f", commit])?;
        debug!(commit, "checked out");
        Ok(())
    }

    /// Resolve the parent of `commit`.
    pub fn previous_commit(&self, commit: &str) -> Result<String> {
        let spec = format!("{commit}~1");
        let out = self.run_capture(&["rev-parse", &spec])?;
        let sha = out.trim().to_string();
        if sha.is_empty() {
            return Err(anyhow!("empty rev-parse output for {spec}"));
        }
        Ok(sha)
    }

    /// Check out the commit the project was at before the refactoring.
    pub fn checkout_before(&self, commit: &str) -> Result<String> {
        let previous = self.previous_commit(commit)?;
        self.force_checkout(&previous)?;
        Ok(previous)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("run git {}", args.join(" ")))
    }

    fn run_checked(&self, args: &[&str]) -> Result<()> {
        let out = self.run(args)?;
        if !out.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&out.stderr).trim()
            ));
        }
        Ok(())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let out = self.run(args)?;
        if !out.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&out.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn init_repo() -> (tempfile::TempDir, Git) {
        let temp = tempfile::tempdir().expect("tempdir");
        let git = Git::new(temp.path());
        let run = |args: &[&str]| {
            let out = Command::new("git")
                .args(args)
                .current_dir(temp.path())
                .output()
                .expect("git");
            assert!(out.status.success(), "git {args:?} failed");
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "test"]);
        fs::write(temp.path().join("a.txt"), "one\n").expect("write");
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "one"]);
        fs::write(temp.path().join("a.txt"), "two\n").expect("write");
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "two"]);
        (temp, git)
    }

    #[test]
    fn checkout_before_lands_on_the_parent() {
        let (temp, git) = init_repo();
        let head = git.run_capture(&["rev-parse", "HEAD"]).expect("head");
        let previous = git.checkout_before(head.trim()).expect("checkout");
        assert_ne!(previous, head.trim());
        let content = fs::read_to_string(temp.path().join("a.txt")).expect("read");
        assert_eq!(content, "one\n");
    }

    #[test]
    fn force_checkout_discards_local_edits() {
        let (temp, git) = init_repo();
        fs::write(temp.path().join("a.txt"), "dirty\n").expect("write");
        let head = git.run_capture(&["rev-parse", "HEAD"]).expect("head");
        git.force_checkout(head.trim()).expect("checkout");
        let content = fs::read_to_string(temp.path().join("a.txt")).expect("read");
        assert_eq!(content, "two\n");
    }
}
