//! CLI command implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info};

use harness::io::build::GradleBuildDriver;
use harness::io::config::{HarnessConfig, load_config};
use harness::io::dataset::{find_case, load_dataset};
use harness::io::oracle::CliOracle;
use harness::io::style::StyleChecker;
use harness::verify::GitPositioner;
use harness::workflow::engine::CommandAgent;
use harness::workflow::retrieval::NoRetriever;

use crate::outcome::classify_case;
use crate::results::{build_meta, write_run_results};
use crate::run::CaseRunner;
use crate::scratch::create_run_dir;
use crate::summary::print_summary;

/// Run a contiguous slice of the dataset and write the results back.
pub fn run_range(
    config_path: &Path,
    start: Option<usize>,
    end: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cfg = load_checked_config(config_path)?;
    let mut cases = load_dataset(&cfg.dataset_path)?;
    let (lo, hi) = slice_bounds(cases.len(), start, end)?;
    let output_path = output.unwrap_or_else(|| cfg.dataset_path.clone());

    let run_dir = create_run_dir(&cfg.scratch_dir)?;
    debug!(run_dir = %run_dir.display(), lo, hi, "run started");

    let agent = CommandAgent::from_config(&cfg.agent)?;
    let backends = Backends::from_config(&cfg, &run_dir)?;
    let retriever = NoRetriever;
    let runner = CaseRunner {
        agent: &agent,
        oracle: &backends.oracle,
        builder: &backends.builder,
        positioner: &backends.positioner,
        retriever: &retriever,
        style: backends.style.as_ref(),
        project_dir: &cfg.project_dir,
        artifacts_dir: &cfg.artifacts_dir,
        max_steps: cfg.max_workflow_steps,
    };

    let started_at = Utc::now();
    let mut synthesized = Vec::new();
    for case in &mut cases[lo..hi] {
        let appended = runner.run_case(case)?;
        println!(
            "case {} ({}): {:?}",
            case.unique_id,
            case.kind,
            classify_case(case)
        );
        if let Some(move_case) = appended {
            println!(
                "case {} ({}): {:?}",
                move_case.unique_id,
                move_case.kind,
                classify_case(&move_case)
            );
            synthesized.push(move_case);
        }
    }
    let finished_at = Utc::now();

    // Synthetic move-phase cases count toward the run totals and are
    // appended to the dataset.
    let mut ran: Vec<_> = cases[lo..hi].to_vec();
    ran.extend(synthesized.iter().cloned());
    cases.extend(synthesized);

    let meta = build_meta(&cfg.dataset_path, started_at, finished_at, &ran);
    write_run_results(&run_dir, &output_path, &cases, &meta, &cfg)?;
    info!(
        output = %output_path.display(),
        run_dir = %run_dir.display(),
        "run finished"
    );
    println!(
        "ran {} cases: success={} oracle_fail={} compile_fail={} error={} repaired={}",
        meta.cases_run, meta.success, meta.oracle_fail, meta.compile_fail, meta.error,
        meta.repaired
    );
    Ok(())
}

/// Print one case record with its stored results.
pub fn show_case(config_path: &Path, case_id: &str) -> Result<()> {
    let cfg = load_checked_config(config_path)?;
    let cases = load_dataset(&cfg.dataset_path)?;
    let case = find_case(&cases, case_id)?;
    let mut rendered = serde_json::to_string_pretty(case).context("serialize case")?;
    rendered.push('\n');
    print!("{rendered}");
    Ok(())
}

/// Print aggregate per-kind counts for the whole dataset.
pub fn summarize(config_path: &Path) -> Result<()> {
    let cfg = load_checked_config(config_path)?;
    let cases = load_dataset(&cfg.dataset_path)?;
    print_summary(&cases);
    Ok(())
}

fn load_checked_config(path: &Path) -> Result<HarnessConfig> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn slice_bounds(
    len: usize,
    start: Option<usize>,
    end: Option<usize>,
) -> Result<(usize, usize)> {
    let lo = start.unwrap_or(0);
    let hi = end.unwrap_or(len).min(len);
    if lo > hi {
        bail!("--start {lo} is past --end {hi}");
    }
    Ok((lo, hi))
}

/// Concrete backends built from the config; scratch files go to the run
/// directory.
struct Backends {
    oracle: CliOracle,
    builder: GradleBuildDriver,
    positioner: GitPositioner,
    style: Option<StyleChecker>,
}

impl Backends {
    fn from_config(cfg: &HarnessConfig, run_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(&cfg.artifacts_dir).context("create artifacts directory")?;
        let style = if cfg.style.jar.as_os_str().is_empty() {
            None
        } else {
            Some(StyleChecker::new(
                &cfg.style.jar,
                &cfg.style.config,
                run_dir,
                Duration::from_secs(cfg.style.timeout_secs),
                cfg.style.output_limit_bytes,
            ))
        };
        Ok(Self {
            oracle: CliOracle::new(
                cfg.oracle.command.clone(),
                run_dir,
                Duration::from_secs(cfg.oracle.timeout_secs),
                cfg.oracle.output_limit_bytes,
            ),
            builder: GradleBuildDriver::new(
                &cfg.project_dir,
                &cfg.default_jdk,
                Duration::from_secs(cfg.build.timeout_secs),
                cfg.build.output_limit_bytes,
            ),
            positioner: GitPositioner::new(&cfg.project_dir),
            style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_default_to_the_whole_dataset() {
        assert_eq!(slice_bounds(5, None, None).expect("bounds"), (0, 5));
    }

    #[test]
    fn slice_bounds_clamp_the_end() {
        assert_eq!(slice_bounds(5, Some(2), Some(100)).expect("bounds"), (2, 5));
    }

    #[test]
    fn slice_bounds_reject_an_inverted_range() {
        assert!(slice_bounds(5, Some(4), Some(2)).is_err());
    }
}
