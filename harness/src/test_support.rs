//! Scripted fakes for tests.
//!
//! Available to unit tests and, via the `test-support` feature, to
//! downstream crates' tests. Fakes consume scripted results in order and
//! count invocations so tests can assert what was (not) called.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::Result;

use crate::io::build::{BuildDriver, BuildReport, BuildRequest};
use crate::io::oracle::{Oracle, OracleRequest, OracleVerdict, verdict_report};
use crate::verify::TreePositioner;
use crate::workflow::engine::{Agent, AgentReply};
use crate::workflow::messages::{Message, Role};
use crate::workflow::retrieval::ExampleRetriever;

/// Oracle that replays scripted verdicts.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    verdicts: RefCell<VecDeque<bool>>,
    pub calls: RefCell<usize>,
}

impl ScriptedOracle {
    pub fn with_verdicts(verdicts: impl IntoIterator<Item = bool>) -> Self {
        Self {
            verdicts: RefCell::new(verdicts.into_iter().collect()),
            calls: RefCell::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }
}

impl Oracle for ScriptedOracle {
    fn check(&self, request: &OracleRequest<'_>) -> Result<OracleVerdict> {
        *self.calls.borrow_mut() += 1;
        let detected = self
            .verdicts
            .borrow_mut()
            .pop_front()
            .expect("scripted oracle ran out of verdicts");
        Ok(OracleVerdict {
            detected,
            report: verdict_report(request.kind, detected),
        })
    }
}

/// Build driver that replays scripted reports.
#[derive(Debug, Default)]
pub struct ScriptedBuilder {
    reports: RefCell<VecDeque<BuildReport>>,
    pub calls: RefCell<usize>,
}

impl ScriptedBuilder {
    pub fn with_reports(reports: impl IntoIterator<Item = BuildReport>) -> Self {
        Self {
            reports: RefCell::new(reports.into_iter().collect()),
            calls: RefCell::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_reports([ok_build()])
    }

    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }
}

impl BuildDriver for ScriptedBuilder {
    fn build(&self, _request: &BuildRequest<'_>) -> Result<BuildReport> {
        *self.calls.borrow_mut() += 1;
        Ok(self
            .reports
            .borrow_mut()
            .pop_front()
            .expect("scripted builder ran out of reports"))
    }
}

pub fn ok_build() -> BuildReport {
    BuildReport {
        checkout_ok: true,
        write_ok: true,
        build_ok: true,
        error_log: String::new(),
    }
}

pub fn failed_build(error_log: &str) -> BuildReport {
    BuildReport {
        checkout_ok: true,
        write_ok: true,
        build_ok: false,
        error_log: error_log.to_string(),
    }
}

/// Positioner that leaves the tree as the test laid it out.
#[derive(Debug, Default)]
pub struct NoopPositioner;

impl TreePositioner for NoopPositioner {
    fn position_before(&self, _commit: &str) -> Result<()> {
        Ok(())
    }
}

/// Agent that replays scripted replies regardless of the transcript.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    replies: RefCell<VecDeque<AgentReply>>,
}

impl ScriptedAgent {
    pub fn with_replies(replies: impl IntoIterator<Item = AgentReply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
        }
    }
}

impl Agent for ScriptedAgent {
    fn reply(&self, _role: Role, _transcript: &[Message]) -> Result<AgentReply> {
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted agent ran out of replies"))
    }
}

/// Retriever that always returns the same canned example.
#[derive(Debug, Default)]
pub struct CannedRetriever {
    pub example: String,
}

impl ExampleRetriever for CannedRetriever {
    fn best_example(
        &self,
        _source_code: &str,
        _kind: crate::core::types::RefactoringKind,
    ) -> Result<Option<String>> {
        if self.example.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.example.clone()))
        }
    }
}
