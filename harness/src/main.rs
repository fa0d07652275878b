//! Refactoring verification harness CLI.
//!
//! `verify` checks a stored answer offline, `run` drives the cooperative
//! agent loop for one case, `validate` checks the dataset against its
//! schema, `init` writes a default config.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use harness::core::session::CaseSession;
use harness::exit_codes;
use harness::io::build::GradleBuildDriver;
use harness::io::config::{HarnessConfig, load_config, write_config};
use harness::io::dataset::{find_case, load_dataset};
use harness::io::oracle::CliOracle;
use harness::io::style::StyleChecker;
use harness::verify::{GitPositioner, Verifier};
use harness::workflow::engine::{CommandAgent, StopReason, WorkflowEngine};
use harness::workflow::messages::{Role, render_transcript};
use harness::workflow::prompts::opening_prompt;
use harness::workflow::retrieval::NoRetriever;
use harness::workflow::tools::ToolExecutor;

#[derive(Parser)]
#[command(
    name = "harness",
    version,
    about = "Agent-driven refactoring verification harness"
)]
struct Cli {
    /// Config file (TOML).
    #[arg(short, long, default_value = "harness.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Check the dataset against its schema and per-case invariants.
    Validate,
    /// Verify a stored answer for one case, without any agent.
    Verify {
        /// Case `uniqueId` from the dataset.
        #[arg(long)]
        case_id: String,
        /// File holding the raw answer text.
        #[arg(long)]
        response: PathBuf,
    },
    /// Run the cooperative agent loop for one case.
    Run {
        /// Case `uniqueId` from the dataset.
        #[arg(long)]
        case_id: String,
    },
}

fn main() {
    harness::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Validate => cmd_validate(&cli.config),
        Command::Verify { case_id, response } => cmd_verify(&cli.config, &case_id, &response),
        Command::Run { case_id } => cmd_run(&cli.config, &case_id),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if config_path.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", config_path.display());
    }
    write_config(config_path, &HarnessConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(config_path: &Path) -> Result<i32> {
    let cfg = load_checked_config(config_path)?;
    let cases = load_dataset(&cfg.dataset_path)?;
    println!("{} cases, dataset is valid", cases.len());
    Ok(exit_codes::OK)
}

fn cmd_verify(config_path: &Path, case_id: &str, response: &Path) -> Result<i32> {
    let cfg = load_checked_config(config_path)?;
    let cases = load_dataset(&cfg.dataset_path)?;
    let case = find_case(&cases, case_id)?;
    let answer = fs::read_to_string(response)
        .with_context(|| format!("read response file {}", response.display()))?;

    let wiring = Wiring::from_config(&cfg)?;
    let report = wiring.verifier().verify_answer(case, &answer)?;

    println!("{}", report.message);
    if !report.error_log.is_empty() {
        eprintln!("{}", report.error_log);
    }
    if report.outcome.verified() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::UNVERIFIED)
    }
}

fn cmd_run(config_path: &Path, case_id: &str) -> Result<i32> {
    let cfg = load_checked_config(config_path)?;
    let cases = load_dataset(&cfg.dataset_path)?;
    let case = find_case(&cases, case_id)?;

    let agent = CommandAgent::from_config(&cfg.agent)?;
    let wiring = Wiring::from_config(&cfg)?;
    let retriever = NoRetriever;
    let tools = ToolExecutor {
        case,
        verifier: wiring.verifier(),
        retriever: &retriever,
        style: wiring.style.as_ref(),
        artifacts_dir: &cfg.artifacts_dir,
    };
    let engine = WorkflowEngine {
        agent: &agent,
        tools: &tools,
        max_steps: cfg.max_workflow_steps,
    };

    let mut session = CaseSession::new(&case.unique_id);
    let opening = opening_prompt(case)?;
    let outcome = engine.run(&mut session, &opening, Role::Developer);

    println!("{}", render_transcript(&outcome.transcript));
    match outcome.stop {
        StopReason::Verified => Ok(exit_codes::OK),
        StopReason::StepCeiling => {
            eprintln!("workflow hit the step ceiling without converging");
            Ok(exit_codes::UNVERIFIED)
        }
        StopReason::AgentError(detail) => {
            eprintln!("agent backend failed: {detail}");
            Ok(exit_codes::UNVERIFIED)
        }
    }
}

fn load_checked_config(path: &Path) -> Result<HarnessConfig> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Concrete oracle, build, and positioning backends built from the config.
struct Wiring {
    oracle: CliOracle,
    builder: GradleBuildDriver,
    positioner: GitPositioner,
    style: Option<StyleChecker>,
    project_dir: PathBuf,
    artifacts_dir: PathBuf,
}

impl Wiring {
    fn from_config(cfg: &HarnessConfig) -> Result<Self> {
        fs::create_dir_all(&cfg.scratch_dir).context("create scratch directory")?;
        fs::create_dir_all(&cfg.artifacts_dir).context("create artifacts directory")?;
        let style = if cfg.style.jar.as_os_str().is_empty() {
            None
        } else {
            Some(StyleChecker::new(
                &cfg.style.jar,
                &cfg.style.config,
                &cfg.scratch_dir,
                Duration::from_secs(cfg.style.timeout_secs),
                cfg.style.output_limit_bytes,
            ))
        };
        Ok(Self {
            oracle: CliOracle::new(
                cfg.oracle.command.clone(),
                &cfg.scratch_dir,
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
            project_dir: cfg.project_dir.clone(),
            artifacts_dir: cfg.artifacts_dir.clone(),
        })
    }

    fn verifier(&self) -> Verifier<'_> {
        Verifier {
            oracle: &self.oracle,
            builder: &self.builder,
            positioner: &self.positioner,
            project_dir: &self.project_dir,
            artifacts_dir: &self.artifacts_dir,
        }
    }
}
