//! Result persistence.
//!
//! The updated dataset is written back in its own JSON layout; per-run
//! metadata (timestamps, dataset fingerprint, outcome counts) goes to
//! `meta.json` in the run directory alongside a snapshot of the effective
//! config.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use harness::core::case::RefactoringCase;
use harness::io::config::HarnessConfig;
use harness::io::dataset::write_dataset;

use crate::outcome::{CaseOutcome, classify_case};

/// Metadata for one eval run, persisted to `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    /// SHA-256 of the input dataset file, for reproducibility tracking.
    pub dataset_sha256: String,
    pub dataset_path: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub cases_run: usize,
    pub success: usize,
    pub oracle_fail: usize,
    pub compile_fail: usize,
    pub error: usize,
    pub repaired: usize,
}

/// Tally outcomes over the cases that were run.
pub fn count_outcomes(cases: &[RefactoringCase]) -> (usize, usize, usize, usize, usize) {
    let mut success = 0;
    let mut oracle_fail = 0;
    let mut compile_fail = 0;
    let mut error = 0;
    let mut repaired = 0;
    for case in cases {
        match classify_case(case) {
            CaseOutcome::Success => success += 1,
            CaseOutcome::OracleFail => oracle_fail += 1,
            CaseOutcome::CompileFail => compile_fail += 1,
            CaseOutcome::Error => error += 1,
        }
        if case.repair_compile_and_test_result == Some(true) {
            repaired += 1;
        }
    }
    (success, oracle_fail, compile_fail, error, repaired)
}

pub fn build_meta(
    dataset_path: &Path,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    cases: &[RefactoringCase],
) -> RunMeta {
    let dataset_sha256 = file_sha256(dataset_path).unwrap_or_default();
    let duration = finished_at - started_at;
    let (success, oracle_fail, compile_fail, error, repaired) = count_outcomes(cases);
    RunMeta {
        dataset_sha256,
        dataset_path: dataset_path.display().to_string(),
        start_time: started_at.to_rfc3339(),
        end_time: finished_at.to_rfc3339(),
        duration_secs: duration.num_milliseconds() as f64 / 1000.0,
        cases_run: cases.len(),
        success,
        oracle_fail,
        compile_fail,
        error,
        repaired,
    }
}

/// Persist the updated dataset, run metadata, and a config snapshot.
pub fn write_run_results(
    run_dir: &Path,
    output_path: &Path,
    cases: &[RefactoringCase],
    meta: &RunMeta,
    cfg: &HarnessConfig,
) -> Result<()> {
    write_dataset(output_path, cases)?;
    write_meta(&run_dir.join("meta.json"), meta)?;
    let snapshot = toml::to_string_pretty(cfg).context("serialize config snapshot")?;
    fs::write(run_dir.join("config.toml"), snapshot).context("write config snapshot")?;
    debug!(run_dir = %run_dir.display(), "run results written");
    Ok(())
}

pub fn write_meta(path: &Path, meta: &RunMeta) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(meta).context("serialize run meta")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
