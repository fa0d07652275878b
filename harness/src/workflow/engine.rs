//! The cooperative agent loop.
//!
//! Two agents alternate over a shared transcript: the Developer proposes,
//! the Reviewer checks with tools. The loop ends when both verdicts hold,
//! when the step ceiling is hit, or when the agent backend fails; in every
//! case the transcript so far is returned.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::session::CaseSession;
use crate::io::config::AgentConfig;
use crate::io::process::run_with_timeout;
use crate::workflow::messages::{Message, Role};
use crate::workflow::prompts;
use crate::workflow::router::{Route, route};
use crate::workflow::tools::{ToolCall, ToolExecutor};

/// Turns before a case is abandoned as unconverged.
pub const MAX_WORKFLOW_STEPS: u32 = 50;

/// One agent turn: prose plus an optional tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub content: String,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
}

/// Blocking agent backend, one reply per turn.
pub trait Agent {
    fn reply(&self, role: Role, transcript: &[Message]) -> Result<AgentReply>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Both verdicts hold.
    Verified,
    /// The step ceiling was reached without convergence.
    StepCeiling,
    /// The agent backend failed; the transcript is partial.
    AgentError(String),
}

#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub transcript: Vec<Message>,
    pub stop: StopReason,
}

/// Drives one case through the agent loop.
pub struct WorkflowEngine<'a> {
    pub agent: &'a dyn Agent,
    pub tools: &'a ToolExecutor<'a>,
    pub max_steps: u32,
}

impl WorkflowEngine<'_> {
    #[instrument(skip_all, fields(case_id = %session.case_id, ?start_role))]
    pub fn run(
        &self,
        session: &mut CaseSession,
        opening_prompt: &str,
        start_role: Role,
    ) -> WorkflowRun {
        let mut transcript = vec![Message::user(opening_prompt)];
        let mut role = start_role;

        for step in 0..self.max_steps {
            let reply = match self.agent.reply(role, &transcript) {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(step, err = %err, "agent backend failed");
                    return WorkflowRun {
                        transcript,
                        stop: StopReason::AgentError(format!("{err:#}")),
                    };
                }
            };
            let message = Message::agent(role, reply.content, reply.tool_call);
            transcript.push(message.clone());

            match route(role, &message, session) {
                Route::End => {
                    info!(step, "workflow verified");
                    return WorkflowRun {
                        transcript,
                        stop: StopReason::Verified,
                    };
                }
                Route::Continue => {
                    if let Some(call) = &message.tool_call {
                        // A refused check: report the refusal in-band so the
                        // agent sees why nothing ran.
                        transcript.push(Message::tool(
                            call.name(),
                            "check attempt budget exhausted; report the current \
                             verdicts to the other agent instead",
                        ));
                    }
                    role = role.counterpart();
                    debug!(step, ?role, "conversation handed over");
                }
                Route::CallTool => {
                    if let Some(call) = &message.tool_call {
                        let result = self.tools.execute(call, session);
                        transcript.push(Message::tool(call.name(), result));
                        if session.verified() {
                            info!(step, "workflow verified");
                            return WorkflowRun {
                                transcript,
                                stop: StopReason::Verified,
                            };
                        }
                    }
                }
            }
        }

        warn!(max_steps = self.max_steps, "workflow hit the step ceiling");
        WorkflowRun {
            transcript,
            stop: StopReason::StepCeiling,
        }
    }
}

/// Agent backed by an external command.
///
/// Per turn the command receives `{role, system, messages}` as JSON on stdin
/// and must print an `AgentReply` JSON object on stdout.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandAgent {
    pub fn from_config(cfg: &AgentConfig) -> Result<Self> {
        if cfg.command.is_empty() || cfg.command[0].trim().is_empty() {
            return Err(anyhow!("agent.command is not configured"));
        }
        Ok(Self {
            command: cfg.command.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        })
    }
}

impl Agent for CommandAgent {
    fn reply(&self, role: Role, transcript: &[Message]) -> Result<AgentReply> {
        let system = prompts::system_prompt(role)?;
        let payload = serde_json::json!({
            "role": role,
            "system": system,
            "messages": transcript,
        });
        let stdin = serde_json::to_vec(&payload).context("serialize agent payload")?;

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("agent command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        let out = run_with_timeout(cmd, Some(&stdin), self.timeout, self.output_limit_bytes)
            .context("run agent command")?;
        if !out.success() {
            return Err(anyhow!(
                "agent command failed: {}",
                out.stderr_text().trim()
            ));
        }
        serde_json::from_str(&out.stdout_text()).context("parse agent reply json")
    }
}
