//! Style-check adapter.
//!
//! Candidate method code is wrapped in a synthetic class so the linter can
//! parse it; reported line numbers are shifted back by the wrapper preamble.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, instrument};

use crate::io::process::run_with_timeout;

/// Lines the synthetic wrapper adds before the candidate code.
const WRAPPER_PREAMBLE_LINES: u32 = 4;

static FINDING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\d+)(?::(\d+))?: (.+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleFinding {
    /// 1-based line within the candidate code.
    pub line: u32,
    /// 1-based column, 0 when the linter omitted it.
    pub column: u32,
    pub message: String,
}

/// Invokes a checkstyle jar against candidate code.
#[derive(Debug, Clone)]
pub struct StyleChecker {
    jar: PathBuf,
    config: PathBuf,
    scratch_dir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl StyleChecker {
    pub fn new(
        jar: impl Into<PathBuf>,
        config: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Self {
        Self {
            jar: jar.into(),
            config: config.into(),
            scratch_dir: scratch_dir.into(),
            timeout,
            output_limit_bytes,
        }
    }

    /// Lint `code` and return findings with lines mapped back onto it.
    #[instrument(skip_all)]
    pub fn check(&self, code: &str) -> Result<Vec<StyleFinding>> {
        fs::create_dir_all(&self.scratch_dir)
            .with_context(|| format!("create scratch dir {}", self.scratch_dir.display()))?;
        let path = self.scratch_dir.join("StyleScratch.java");
        fs::write(&path, wrap_in_class(code))
            .with_context(|| format!("write scratch file {}", path.display()))?;

        let mut cmd = Command::new("java");
        cmd.arg("-jar")
            .arg(&self.jar)
            .arg("-c")
            .arg(&self.config)
            .arg(&path);
        // Checkstyle exits nonzero when it finds violations, so only the
        // output matters here.
        let out = run_with_timeout(cmd, None, self.timeout, self.output_limit_bytes)
            .context("run checkstyle")?;
        let findings = parse_findings(&out.stdout_text(), WRAPPER_PREAMBLE_LINES);
        debug!(count = findings.len(), "style check finished");
        Ok(findings)
    }
}

fn wrap_in_class(code: &str) -> String {
    format!("package scratch;\n\npublic class StyleScratch {{\n\n{code}\n}}\n")
}

/// Parse `path:line:column: message` findings, shifting lines back by
/// `offset`. Findings inside the wrapper itself are dropped.
pub fn parse_findings(output: &str, offset: u32) -> Vec<StyleFinding> {
    let mut findings = Vec::new();
    for line in output.lines() {
        let Some(caps) = FINDING_RE.captures(line) else {
            continue;
        };
        let Ok(reported) = caps[1].parse::<u32>() else {
            continue;
        };
        if reported <= offset {
            continue;
        }
        let column = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        findings.push(StyleFinding {
            line: reported - offset,
            column,
            message: caps[3].trim().to_string(),
        });
    }
    findings
}

/// Render findings the way the Reviewer relays them.
pub fn format_findings(findings: &[StyleFinding]) -> String {
    if findings.is_empty() {
        return "no style violations found".to_string();
    }
    let mut out = format!("{} style violation(s):", findings.len());
    for finding in findings {
        out.push_str(&format!(
            "\n  line {}, column {}: {}",
            finding.line, finding.column, finding.message
        ));
    }
    out
}
