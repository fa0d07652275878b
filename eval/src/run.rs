//! Per-case driving.
//!
//! Runs the cooperative workflow for one dataset case, appends the result
//! fields in place, runs the compile-repair pass when the oracle accepted
//! but the build did not, and handles the two-phase extract-and-move
//! protocol (extract first; on success a synthetic `<id>_move` case carries
//! the move phase).

use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument, warn};

use harness::core::case::RefactoringCase;
use harness::core::session::CaseSession;
use harness::core::types::RefactoringKind;
use harness::io::build::BuildDriver;
use harness::io::oracle::Oracle;
use harness::io::style::StyleChecker;
use harness::verify::{TreePositioner, Verifier};
use harness::workflow::engine::{Agent, StopReason, WorkflowEngine, WorkflowRun};
use harness::workflow::messages::{Role, render_transcript};
use harness::workflow::prompts::opening_prompt;
use harness::workflow::repair::run_repair;
use harness::workflow::retrieval::ExampleRetriever;
use harness::workflow::tools::ToolExecutor;

use crate::outcome::{CaseOutcome, classify_case};

/// Everything one case run needs, borrowed so tests can script the seams.
pub struct CaseRunner<'a> {
    pub agent: &'a dyn Agent,
    pub oracle: &'a dyn Oracle,
    pub builder: &'a dyn BuildDriver,
    pub positioner: &'a dyn TreePositioner,
    pub retriever: &'a dyn ExampleRetriever,
    pub style: Option<&'a StyleChecker>,
    pub project_dir: &'a Path,
    pub artifacts_dir: &'a Path,
    pub max_steps: u32,
}

impl CaseRunner<'_> {
    /// Run one case, appending results in place. For extract-and-move cases
    /// the returned record is the synthetic move-phase case to append to the
    /// dataset.
    #[instrument(skip_all, fields(case_id = %case.unique_id, kind = %case.kind))]
    pub fn run_case(&self, case: &mut RefactoringCase) -> Result<Option<RefactoringCase>> {
        if !case.kind.is_supported() {
            warn!("kind is not supported; recording failed verdicts");
            case.oracle_result = Some(false);
            case.compile_and_test_result = Some(false);
            return Ok(None);
        }
        if case.kind == RefactoringKind::ExtractAndMoveMethod {
            return self.run_extract_and_move(case);
        }
        self.run_one_phase(case)?;
        Ok(None)
    }

    /// Phase 1 extracts within the origin file; when it converges (or the
    /// repair pass recovers a compiling candidate), the move phase runs as a
    /// synthetic case whose whole-file text is phase 1's output and whose
    /// span is the extracted method.
    fn run_extract_and_move(&self, case: &mut RefactoringCase) -> Result<Option<RefactoringCase>> {
        let mut phase_one = case.clone();
        phase_one.kind = RefactoringKind::ExtractMethod;
        let session = self.run_phase(&phase_one, case)?;

        // A repaired candidate still carries the extraction; the move phase
        // runs against the repaired whole-file text.
        let whole = if session.verified() {
            session.refactored_code.clone()
        } else if case.repair_compile_and_test_result == Some(true)
            && let Some(repaired) = case.repair_refactored_code.clone()
        {
            repaired
        } else {
            return Ok(None);
        };
        if session.moved_code.trim().is_empty() {
            warn!("no extracted method was captured; skipping the move phase");
            return Ok(None);
        }

        let mut move_case = fresh_case(case);
        move_case.unique_id = format!("{}_move", case.unique_id);
        move_case.kind = RefactoringKind::MoveMethod;
        move_case.source_code_before_for_whole = whole;
        move_case.source_code_before_refactoring = session.moved_code.clone();
        move_case.method_name_before = harness::core::java::public_static_method_name(
            &session.moved_code,
        )
        .unwrap_or_default();

        info!(move_case_id = %move_case.unique_id, "extract phase converged; running the move phase");
        let mut appended = move_case.clone();
        self.run_one_phase(&mut appended)?;
        Ok(Some(appended))
    }

    fn run_one_phase(&self, case: &mut RefactoringCase) -> Result<()> {
        let record = case.clone();
        self.run_phase(&record, case)?;
        Ok(())
    }

    /// Drive the workflow for `driven`, appending results onto `record`.
    fn run_phase(
        &self,
        driven: &RefactoringCase,
        record: &mut RefactoringCase,
    ) -> Result<CaseSession> {
        let tools = self.tools(driven);
        let engine = WorkflowEngine {
            agent: self.agent,
            tools: &tools,
            max_steps: self.max_steps,
        };
        let mut session = CaseSession::new(&driven.unique_id);
        let opening = opening_prompt(driven)?;
        let run = engine.run(&mut session, &opening, Role::Developer);

        append_results(record, &session, &run);
        info!(outcome = ?classify_case(record), stop = ?run.stop, "phase finished");

        if classify_case(record) == CaseOutcome::CompileFail {
            self.repair_pass(driven, record, &tools);
        }
        Ok(session)
    }

    /// Repair is best-effort: its own failures are recorded, never fatal.
    fn repair_pass(
        &self,
        driven: &RefactoringCase,
        record: &mut RefactoringCase,
        tools: &ToolExecutor<'_>,
    ) {
        match run_repair(self.agent, tools, driven, self.artifacts_dir) {
            Ok(outcome) => {
                record.repair_compile_and_test_result = Some(outcome.compile_verdict);
                record.repair_refactored_code = outcome.repaired_code;
                record.repair_chat_log = Some(render_transcript(&outcome.transcript));
            }
            Err(err) => {
                warn!(err = %err, "repair pass could not run");
            }
        }
    }

    fn tools<'c>(&'c self, case: &'c RefactoringCase) -> ToolExecutor<'c> {
        ToolExecutor {
            case,
            verifier: Verifier {
                oracle: self.oracle,
                builder: self.builder,
                positioner: self.positioner,
                project_dir: self.project_dir,
                artifacts_dir: self.artifacts_dir,
            },
            retriever: self.retriever,
            style: self.style,
            artifacts_dir: self.artifacts_dir,
        }
    }
}

fn append_results(record: &mut RefactoringCase, session: &CaseSession, run: &WorkflowRun) {
    record.agent_chat_log = Some(render_transcript(&run.transcript));
    if !session.refactored_code.is_empty() {
        record.agent_refactored_code = Some(session.refactored_code.clone());
    }
    if !session.error_log.is_empty() {
        record.error_log = Some(session.error_log.clone());
    }
    // An agent failure produced no verdict pair; leaving the fields absent
    // classifies the case as an error rather than an oracle rejection.
    if matches!(run.stop, StopReason::AgentError(_)) {
        return;
    }
    record.oracle_result = Some(session.oracle_verdict);
    record.compile_and_test_result = Some(session.compile_verdict);
}

/// Copy of a case with every result field cleared.
fn fresh_case(case: &RefactoringCase) -> RefactoringCase {
    let mut fresh = case.clone();
    fresh.agent_refactored_code = None;
    fresh.oracle_result = None;
    fresh.compile_and_test_result = None;
    fresh.agent_chat_log = None;
    fresh.error_log = None;
    fresh.repair_refactored_code = None;
    fresh.repair_compile_and_test_result = None;
    fresh.repair_chat_log = None;
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use harness::test_support::{
        CannedRetriever, NoopPositioner, ScriptedAgent, ScriptedBuilder, ScriptedOracle,
        failed_build, ok_build,
    };
    use harness::workflow::engine::AgentReply;
    use harness::workflow::tools::ToolCall;

    const DELIM: &str = "##########################";

    fn base_case(kind: RefactoringKind) -> RefactoringCase {
        let json = serde_json::json!({
            "uniqueId": "commons-lang-42",
            "type": kind.as_str(),
            "filePathBefore": "src/main/java/org/example/Widget.java",
            "sourceCodeBeforeRefactoring": "    public int area() {\n        return w * h;\n    }",
            "sourceCodeBeforeForWhole": "package org.example;\n\npublic class Widget {\n    int w;\n    int h;\n\n    public int area() {\n        return w * h;\n    }\n}\n",
            "commitId": "deadbeef",
            "packageNameBefore": "org.example",
            "methodNameBefore": "area",
        });
        serde_json::from_value(json).expect("case")
    }

    struct Fixture {
        oracle: ScriptedOracle,
        builder: ScriptedBuilder,
        positioner: NoopPositioner,
        retriever: CannedRetriever,
        project: tempfile::TempDir,
        artifacts: tempfile::TempDir,
    }

    impl Fixture {
        fn new(oracle: ScriptedOracle, builder: ScriptedBuilder) -> Self {
            Self {
                oracle,
                builder,
                positioner: NoopPositioner,
                retriever: CannedRetriever::default(),
                project: tempfile::tempdir().expect("tempdir"),
                artifacts: tempfile::tempdir().expect("tempdir"),
            }
        }

        fn runner<'a>(&'a self, agent: &'a ScriptedAgent, max_steps: u32) -> CaseRunner<'a> {
            CaseRunner {
                agent,
                oracle: &self.oracle,
                builder: &self.builder,
                positioner: &self.positioner,
                retriever: &self.retriever,
                style: None,
                project_dir: self.project.path(),
                artifacts_dir: self.artifacts.path(),
                max_steps,
            }
        }

        fn add_target_file(&self, rel: &str, contents: &str) {
            let full = self.project.path().join(rel);
            fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
            fs::write(full, contents).expect("write");
        }
    }

    fn answer(content: &str) -> AgentReply {
        AgentReply {
            content: content.to_string(),
            tool_call: None,
        }
    }

    fn check_refactoring(code: &str) -> AgentReply {
        AgentReply {
            content: "checking the refactoring".to_string(),
            tool_call: Some(ToolCall::CheckRefactoring {
                answer: code.to_string(),
            }),
        }
    }

    fn check_compile(code: &str) -> AgentReply {
        AgentReply {
            content: "checking compilation".to_string(),
            tool_call: Some(ToolCall::CheckCompile {
                answer: code.to_string(),
            }),
        }
    }

    const EXTRACT_ANSWER: &str = "    public int area() {\n        return computeArea(w, h);\n    }\n\n    public static int computeArea(int w, int h) {\n        return w * h;\n    }";

    #[test]
    fn successful_extract_appends_result_fields() {
        let fixture = Fixture::new(
            ScriptedOracle::with_verdicts([true]),
            ScriptedBuilder::succeeding(),
        );
        let agent = ScriptedAgent::with_replies([
            answer(EXTRACT_ANSWER),
            check_refactoring(EXTRACT_ANSWER),
            check_compile(EXTRACT_ANSWER),
        ]);
        let mut case = base_case(RefactoringKind::ExtractMethod);
        let appended = fixture
            .runner(&agent, 10)
            .run_case(&mut case)
            .expect("run");

        assert!(appended.is_none());
        assert_eq!(case.oracle_result, Some(true));
        assert_eq!(case.compile_and_test_result, Some(true));
        assert_eq!(classify_case(&case), CaseOutcome::Success);
        assert!(case.agent_refactored_code.as_deref().expect("code").contains("computeArea"));
        assert!(case.agent_chat_log.as_deref().expect("log").contains("[developer]"));
        assert!(case.repair_chat_log.is_none());
    }

    #[test]
    fn compile_failure_triggers_the_repair_pass() {
        let fixture = Fixture::new(
            ScriptedOracle::with_verdicts([true]),
            ScriptedBuilder::with_reports([failed_build("error: ';' expected"), ok_build()]),
        );
        let agent = ScriptedAgent::with_replies([
            answer(EXTRACT_ANSWER),
            check_refactoring(EXTRACT_ANSWER),
            check_compile(EXTRACT_ANSWER),
            answer("I cannot fix this here"),
            // Repair pass starts with a fresh transcript.
            check_compile(EXTRACT_ANSWER),
        ]);
        let mut case = base_case(RefactoringKind::ExtractMethod);
        fixture
            .runner(&agent, 4)
            .run_case(&mut case)
            .expect("run");

        assert_eq!(classify_case(&case), CaseOutcome::CompileFail);
        assert_eq!(case.repair_compile_and_test_result, Some(true));
        assert!(case.repair_refactored_code.is_some());
        assert!(case.repair_chat_log.as_deref().expect("log").contains("[repairer]"));
        assert_eq!(fixture.builder.call_count(), 2);
    }

    #[test]
    fn extract_and_move_appends_a_synthetic_move_case() {
        let fixture = Fixture::new(
            ScriptedOracle::with_verdicts([true, true]),
            ScriptedBuilder::succeeding(),
        );
        let target_rel = "src/main/java/org/example/util/Geometry.java";
        fixture.add_target_file(
            target_rel,
            "package org.example.util;\n\npublic class Geometry {\n}\n",
        );

        let moved = "public static int computeArea(int w, int h) {\n        return w * h;\n    }";
        let caller = "    public int area() {\n        return Geometry.computeArea(w, h);\n    }";
        let move_answer = format!("{target_rel}\n{DELIM}\n{moved}\n{DELIM}\n{caller}");

        let agent = ScriptedAgent::with_replies([
            answer(EXTRACT_ANSWER),
            check_refactoring(EXTRACT_ANSWER),
            check_compile(EXTRACT_ANSWER),
            answer(&move_answer),
            check_refactoring(&move_answer),
            check_compile(&move_answer),
        ]);
        let mut case = base_case(RefactoringKind::ExtractAndMoveMethod);
        let appended = fixture
            .runner(&agent, 10)
            .run_case(&mut case)
            .expect("run")
            .expect("synthetic move case");

        assert_eq!(classify_case(&case), CaseOutcome::Success);
        assert_eq!(appended.unique_id, "commons-lang-42_move");
        assert_eq!(appended.kind, RefactoringKind::MoveMethod);
        assert!(appended.source_code_before_for_whole.contains("computeArea"));
        assert!(appended.source_code_before_refactoring.starts_with("public static int computeArea"));
        assert_eq!(appended.method_name_before, "computeArea");
        assert_eq!(classify_case(&appended), CaseOutcome::Success);
        // Extract phase builds; the pure move phase is structural.
        assert_eq!(fixture.builder.call_count(), 1);
    }

    #[test]
    fn repaired_extract_phase_still_runs_the_move_phase() {
        let fixture = Fixture::new(
            ScriptedOracle::with_verdicts([true, true]),
            ScriptedBuilder::with_reports([failed_build("error: ';' expected"), ok_build()]),
        );
        let target_rel = "src/main/java/org/example/util/Geometry.java";
        fixture.add_target_file(
            target_rel,
            "package org.example.util;\n\npublic class Geometry {\n}\n",
        );

        let moved = "public static int computeArea(int w, int h) {\n        return w * h;\n    }";
        let caller = "    public int area() {\n        return Geometry.computeArea(w, h);\n    }";
        let move_answer = format!("{target_rel}\n{DELIM}\n{moved}\n{DELIM}\n{caller}");

        let agent = ScriptedAgent::with_replies([
            answer(EXTRACT_ANSWER),
            check_refactoring(EXTRACT_ANSWER),
            check_compile(EXTRACT_ANSWER),
            answer("I cannot fix this here"),
            // Repair pass starts with a fresh transcript.
            check_compile(EXTRACT_ANSWER),
            answer(&move_answer),
            check_refactoring(&move_answer),
            check_compile(&move_answer),
        ]);
        let mut case = base_case(RefactoringKind::ExtractAndMoveMethod);
        let appended = fixture
            .runner(&agent, 4)
            .run_case(&mut case)
            .expect("run")
            .expect("synthetic move case");

        assert_eq!(classify_case(&case), CaseOutcome::CompileFail);
        assert_eq!(case.repair_compile_and_test_result, Some(true));
        assert_eq!(appended.unique_id, "commons-lang-42_move");
        assert!(appended.source_code_before_for_whole.contains("computeArea"));
        assert_eq!(classify_case(&appended), CaseOutcome::Success);
        // Extract attempt, then the repair compile check; the move phase is structural.
        assert_eq!(fixture.builder.call_count(), 2);
    }

    #[test]
    fn unsupported_kind_records_failed_verdicts_without_running() {
        let fixture = Fixture::new(ScriptedOracle::default(), ScriptedBuilder::default());
        let agent = ScriptedAgent::default();
        let mut case = base_case(RefactoringKind::MoveAndInlineMethod);
        let appended = fixture
            .runner(&agent, 10)
            .run_case(&mut case)
            .expect("run");
        assert!(appended.is_none());
        assert_eq!(case.oracle_result, Some(false));
        assert_eq!(case.compile_and_test_result, Some(false));
        assert_eq!(fixture.oracle.call_count(), 0);
    }

    #[test]
    fn agent_failure_leaves_the_verdict_pair_absent() {
        let fixture = Fixture::new(ScriptedOracle::default(), ScriptedBuilder::default());
        let agent = ScriptedAgent::with_replies([answer(EXTRACT_ANSWER)]);
        let mut case = base_case(RefactoringKind::ExtractMethod);
        fixture
            .runner(&agent, 10)
            .run_case(&mut case)
            .expect("run");
        assert_eq!(case.oracle_result, None);
        assert_eq!(case.compile_and_test_result, None);
        assert_eq!(classify_case(&case), CaseOutcome::Error);
        assert!(case.agent_chat_log.is_some());
    }
}
