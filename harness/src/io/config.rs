//! Harness configuration (TOML).
//!
//! Points at the experiment project checkout, the dataset, and the external
//! tools. Edited by humans, so it must stay stable and automatable; missing
//! fields default to sensible values.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Git checkout of the Java project the cases refer to.
    pub project_dir: PathBuf,

    /// Case dataset (JSON array of records).
    pub dataset_path: PathBuf,

    /// Where oracle scratch files and failure artifacts go.
    pub scratch_dir: PathBuf,
    pub artifacts_dir: PathBuf,

    /// JDK version restored after each compile check.
    pub default_jdk: String,

    /// Workflow turns before a case is abandoned.
    pub max_workflow_steps: u32,

    pub oracle: OracleConfig,
    pub build: BuildConfig,
    pub agent: AgentConfig,
    pub style: StyleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Detection executable, e.g. `["java","-jar","refactoring-oracle.jar"]`.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Command spawned per agent turn; receives the transcript JSON on
    /// stdin and prints a reply JSON on stdout.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StyleConfig {
    /// Checkstyle jar; empty disables the style tool.
    pub jar: PathBuf,
    pub config: PathBuf,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("project"),
            dataset_path: PathBuf::from("data/dataset.json"),
            scratch_dir: PathBuf::from("data/scratch"),
            artifacts_dir: PathBuf::from("data/artifacts"),
            default_jdk: "17".to_string(),
            max_workflow_steps: 50,
            oracle: OracleConfig::default(),
            build: BuildConfig::default(),
            agent: AgentConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "java".to_string(),
                "-jar".to_string(),
                "refactoring-oracle.jar".to_string(),
            ],
            timeout_secs: 5 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 10 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            jar: PathBuf::new(),
            config: PathBuf::new(),
            timeout_secs: 2 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_workflow_steps == 0 {
            return Err(anyhow!("max_workflow_steps must be > 0"));
        }
        if self.default_jdk.trim().is_empty() {
            return Err(anyhow!("default_jdk must be non-empty"));
        }
        if self.oracle.command.is_empty() || self.oracle.command[0].trim().is_empty() {
            return Err(anyhow!("oracle.command must be a non-empty array"));
        }
        for (label, timeout) in [
            ("oracle.timeout_secs", self.oracle.timeout_secs),
            ("build.timeout_secs", self.build.timeout_secs),
            ("agent.timeout_secs", self.agent.timeout_secs),
        ] {
            if timeout == 0 {
                return Err(anyhow!("{label} must be > 0"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HarnessConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
