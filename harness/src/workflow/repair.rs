//! Repair pass for refactorings the oracle accepted but the build rejected.
//!
//! Reuses the workflow engine with the Repairer role: the session starts
//! with the oracle verdict already granted, so the loop converges as soon
//! as a compile check passes.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::case::RefactoringCase;
use crate::core::session::CaseSession;
use crate::io::artifacts::{read_buggy_code, read_error_log};
use crate::workflow::engine::{Agent, StopReason, WorkflowEngine};
use crate::workflow::messages::{Message, Role};
use crate::workflow::prompts::repair_opening_prompt;
use crate::workflow::tools::ToolExecutor;

/// Repairs get a shorter leash than fresh verifications.
pub const MAX_REPAIR_STEPS: u32 = 10;

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub compile_verdict: bool,
    /// The code that last passed a compile check, when one did.
    pub repaired_code: Option<String>,
    pub transcript: Vec<Message>,
}

/// Run the repair loop for a case whose failure artifacts are on disk.
#[instrument(skip_all, fields(case_id = %case.unique_id))]
pub fn run_repair(
    agent: &dyn Agent,
    tools: &ToolExecutor<'_>,
    case: &RefactoringCase,
    artifacts_dir: &Path,
) -> Result<RepairOutcome> {
    let buggy_code = read_buggy_code(artifacts_dir, &case.unique_id)
        .context("read buggy code artifact")?;
    let error_log = read_error_log(artifacts_dir, &case.unique_id)
        .context("read error log artifact")?;

    let mut session = CaseSession::new(&case.unique_id);
    // The oracle already accepted this refactoring; only the build is in
    // question.
    session.oracle_verdict = true;
    session.refactored_code = buggy_code.clone();

    let opening = repair_opening_prompt(&case.unique_id, &buggy_code, &error_log)?;
    let engine = WorkflowEngine {
        agent,
        tools,
        max_steps: MAX_REPAIR_STEPS,
    };
    let run = engine.run(&mut session, &opening, Role::Repairer);

    if run.stop == StopReason::Verified {
        info!("repair converged");
    }
    let repaired_code = session
        .compile_verdict
        .then(|| session.refactored_code.clone());
    Ok(RepairOutcome {
        compile_verdict: session.compile_verdict,
        repaired_code,
        transcript: run.transcript,
    })
}
