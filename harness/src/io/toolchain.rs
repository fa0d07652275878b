//! JDK selection via `jenv`.
//!
//! Dataset projects pin different JDKs per commit; `jenv local` drops a
//! `.java-version` file into the project directory, which Gradle picks up.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::io::process::run_with_timeout;

const JENV_TIMEOUT: Duration = Duration::from_secs(30);
const JENV_OUTPUT_LIMIT: usize = 16 * 1024;

/// Pin the project to `version` and verify the pin took effect.
#[instrument(skip_all, fields(version))]
pub fn switch_jdk(project_dir: &Path, version: &str) -> Result<()> {
    let set = run_jenv(project_dir, &["local", version])?;
    if !set.0 {
        return Err(anyhow!("jenv local {version} failed: {}", set.1.trim()));
    }

    let (ok, report) = run_jenv(project_dir, &["version"])?;
    if !ok {
        return Err(anyhow!("jenv version failed: {}", report.trim()));
    }
    let active = report.split_whitespace().next().unwrap_or_default();
    if active != version {
        return Err(anyhow!(
            "jenv reports JDK {active} after switching to {version}"
        ));
    }
    debug!(version, "jdk pinned");
    Ok(())
}

/// Re-pin the project to the configured default JDK. Best effort: callers
/// invoke this on both success and failure paths.
pub fn restore_jdk(project_dir: &Path, default_version: &str) -> Result<()> {
    let (ok, report) = run_jenv(project_dir, &["local", default_version])?;
    if !ok {
        return Err(anyhow!(
            "jenv local {default_version} failed during restore: {}",
            report.trim()
        ));
    }
    Ok(())
}

fn run_jenv(project_dir: &Path, args: &[&str]) -> Result<(bool, String)> {
    let mut cmd = Command::new("jenv");
    cmd.args(args).current_dir(project_dir);
    let out = run_with_timeout(cmd, None, JENV_TIMEOUT, JENV_OUTPUT_LIMIT)
        .with_context(|| format!("run jenv {}", args.join(" ")))?;
    let mut report = out.stdout_text();
    if !out.stderr.is_empty() {
        report.push_str(&out.stderr_text());
    }
    Ok((out.success(), report))
}
