use serde::{Deserialize, Serialize};

use harness::core::case::RefactoringCase;

/// Classified result of one case run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Oracle and compile check both accepted the refactoring.
    Success,
    /// The oracle rejected the refactoring.
    OracleFail,
    /// The oracle accepted, but the code did not compile.
    CompileFail,
    /// The run produced no verdict pair (agent failure, unsupported kind).
    Error,
}

pub fn classify_outcome(oracle: Option<bool>, compile: Option<bool>) -> CaseOutcome {
    match (oracle, compile) {
        (Some(true), Some(true)) => CaseOutcome::Success,
        (Some(false), _) => CaseOutcome::OracleFail,
        (Some(true), Some(false)) => CaseOutcome::CompileFail,
        (Some(true), None) | (None, _) => CaseOutcome::Error,
    }
}

/// Classify from the result fields stored on a dataset record.
pub fn classify_case(case: &RefactoringCase) -> CaseOutcome {
    classify_outcome(case.oracle_result, case.compile_and_test_result)
}
