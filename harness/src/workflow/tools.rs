//! Tools the agents may invoke.
//!
//! Each tool is a closed enum variant with typed arguments; dispatch is an
//! exhaustive match, so adding a tool is a compile-enforced change. Tool
//! results are always strings for the agents; failures come back as text the
//! Reviewer can relay, never as panics.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::case::RefactoringCase;
use crate::core::fields::{ExtractedFields, extract_fields};
use crate::core::java;
use crate::core::session::CaseSession;
use crate::io::artifacts;
use crate::io::style::{StyleChecker, format_findings};
use crate::verify::{CheckScope, Verifier};
use crate::workflow::retrieval::ExampleRetriever;

/// One tool invocation as emitted by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    /// The method body the case asks to refactor.
    GetMethodCode,
    /// The refactoring kind the case expects.
    GetRefactoringKind,
    /// The method this case's method invokes, for inline kinds.
    GetInvokedMethod,
    /// The best historical example for similar code, if an index is wired.
    GetSimilarExample,
    /// The candidate that last failed to compile (repair workflow).
    GetBuggyCode,
    /// The build log of the last failed compile check (repair workflow).
    GetErrorLog,
    /// Run the detection oracle against a full answer.
    CheckRefactoring { answer: String },
    /// Compile-check a full answer.
    CheckCompile { answer: String },
    /// Lint candidate method code.
    CheckStyle { code: String },
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetMethodCode => "get_method_code",
            ToolCall::GetRefactoringKind => "get_refactoring_kind",
            ToolCall::GetInvokedMethod => "get_invoked_method",
            ToolCall::GetSimilarExample => "get_similar_example",
            ToolCall::GetBuggyCode => "get_buggy_code",
            ToolCall::GetErrorLog => "get_error_log",
            ToolCall::CheckRefactoring { .. } => "check_refactoring",
            ToolCall::CheckCompile { .. } => "check_compile",
            ToolCall::CheckStyle { .. } => "check_style",
        }
    }
}

/// Executes tool calls against the case, the verifier, and the session.
pub struct ToolExecutor<'a> {
    pub case: &'a RefactoringCase,
    pub verifier: Verifier<'a>,
    pub retriever: &'a dyn ExampleRetriever,
    pub style: Option<&'a StyleChecker>,
    pub artifacts_dir: &'a Path,
}

impl ToolExecutor<'_> {
    /// Run one tool call, updating the session with whatever it learned.
    #[instrument(skip_all, fields(tool = call.name(), case_id = %session.case_id))]
    pub fn execute(&self, call: &ToolCall, session: &mut CaseSession) -> String {
        let result = match call {
            ToolCall::GetMethodCode => self.case.source_code_before_refactoring.clone(),
            ToolCall::GetRefactoringKind => self.case.kind.as_str().to_string(),
            ToolCall::GetInvokedMethod => {
                if self.case.invoked_method.trim().is_empty() {
                    "no invoked method is recorded for this case".to_string()
                } else {
                    self.case.invoked_method.clone()
                }
            }
            ToolCall::GetSimilarExample => {
                match self
                    .retriever
                    .best_example(&self.case.source_code_before_refactoring, self.case.kind)
                {
                    Ok(Some(example)) => example,
                    Ok(None) => "no similar example is available".to_string(),
                    Err(err) => format!("example retrieval failed: {err:#}"),
                }
            }
            ToolCall::GetBuggyCode => {
                match artifacts::read_buggy_code(self.artifacts_dir, &session.case_id) {
                    Ok(code) => code,
                    Err(err) => format!("no buggy code is stored for this case: {err:#}"),
                }
            }
            ToolCall::GetErrorLog => {
                match artifacts::read_error_log(self.artifacts_dir, &session.case_id) {
                    Ok(log) => log,
                    Err(err) => format!("no error log is stored for this case: {err:#}"),
                }
            }
            ToolCall::CheckRefactoring { answer } => self.check_refactoring(answer, session),
            ToolCall::CheckCompile { answer } => self.check_compile(answer, session),
            ToolCall::CheckStyle { code } => self.check_style(code),
        };
        debug!(result_bytes = result.len(), "tool executed");
        result
    }

    fn check_refactoring(&self, answer: &str, session: &mut CaseSession) -> String {
        match self
            .verifier
            .verify_answer_scoped(self.case, answer, CheckScope::OracleOnly)
        {
            Ok(report) => {
                session.oracle_verdict = report.outcome.oracle_verdict;
                if !report.outcome.resulting_code.is_empty() {
                    session.refactored_code = report.outcome.resulting_code;
                }
                self.remember_move_fields(answer, session);
                report.message
            }
            Err(err) => {
                session.oracle_verdict = false;
                format!("the refactoring check could not run: {err:#}")
            }
        }
    }

    fn check_compile(&self, answer: &str, session: &mut CaseSession) -> String {
        if java::looks_lazy(answer) {
            session.compile_verdict = false;
            return "the answer elides parts of the code behind a placeholder comment; \
                    provide the complete code"
                .to_string();
        }
        match self
            .verifier
            .verify_answer_scoped(self.case, answer, CheckScope::CompileOnly)
        {
            Ok(report) => {
                session.compile_verdict = report.outcome.compile_verdict;
                session.error_log = report.error_log.clone();
                if !report.outcome.resulting_code.is_empty() {
                    session.refactored_code = report.outcome.resulting_code;
                }
                if report.error_log.is_empty() {
                    report.message
                } else {
                    format!("{}\n{}", report.message, report.error_log)
                }
            }
            Err(err) => {
                session.compile_verdict = false;
                format!("the compile check could not run: {err:#}")
            }
        }
    }

    fn check_style(&self, code: &str) -> String {
        let Some(checker) = self.style else {
            return "style checking is not configured".to_string();
        };
        match checker.check(code) {
            Ok(findings) => format_findings(&findings),
            Err(err) => format!("the style check could not run: {err:#}"),
        }
    }

    /// For dual-file kinds, stash the answer's target path and moved method
    /// so follow-up phases can reuse them.
    fn remember_move_fields(&self, answer: &str, session: &mut CaseSession) {
        if let Ok(ExtractedFields::Move {
            target_file_path,
            moved_code,
            ..
        }) = extract_fields(self.case.kind, answer)
        {
            session.target_file_path = target_file_path;
            session.moved_code = moved_code;
        } else if let Some(method) = java::extract_public_static_method(answer) {
            session.moved_code = method;
        }
    }
}
