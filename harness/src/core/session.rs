//! Per-case verification context.
//!
//! One case is in flight at a time; the session carries everything the tools
//! and the router need between turns, so no state lives outside it.

use serde::{Deserialize, Serialize};

/// How many times the Reviewer may invoke the same check back to back
/// before being forced to hand the conversation on.
pub const CHECK_ATTEMPT_BUDGET: u32 = 2;

/// Mutable state accumulated while one case is being worked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSession {
    pub case_id: String,

    /// Verdict of the latest refactoring-detection check.
    pub oracle_verdict: bool,
    /// Verdict of the latest compile check.
    pub compile_verdict: bool,

    /// Latest candidate answer submitted to a check.
    pub refactored_code: String,
    /// For dual-file kinds, the method text headed for the target file.
    pub moved_code: String,
    /// For dual-file kinds, the target file path from the answer.
    pub target_file_path: String,
    /// Filtered build log from the latest failed compile check.
    pub error_log: String,

    /// Consecutive compile checks the Reviewer may still make.
    pub remaining_compile_checks: u32,
    /// Consecutive oracle checks the Reviewer may still make.
    pub remaining_oracle_checks: u32,
}

impl CaseSession {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            oracle_verdict: false,
            compile_verdict: false,
            refactored_code: String::new(),
            moved_code: String::new(),
            target_file_path: String::new(),
            error_log: String::new(),
            remaining_compile_checks: CHECK_ATTEMPT_BUDGET,
            remaining_oracle_checks: CHECK_ATTEMPT_BUDGET,
        }
    }

    /// Both verdicts hold; the workflow for this case is done.
    pub fn verified(&self) -> bool {
        self.oracle_verdict && self.compile_verdict
    }

    /// Spend one compile-check attempt. Returns false when the budget is
    /// exhausted, in which case the budget re-arms for the next round.
    pub fn try_spend_compile_check(&mut self) -> bool {
        if self.remaining_compile_checks == 0 {
            self.remaining_compile_checks = CHECK_ATTEMPT_BUDGET;
            return false;
        }
        self.remaining_compile_checks -= 1;
        true
    }

    /// Spend one oracle-check attempt, same budget rules.
    pub fn try_spend_oracle_check(&mut self) -> bool {
        if self.remaining_oracle_checks == 0 {
            self.remaining_oracle_checks = CHECK_ATTEMPT_BUDGET;
            return false;
        }
        self.remaining_oracle_checks -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_unverified_with_full_budgets() {
        let session = CaseSession::new("case-1");
        assert!(!session.verified());
        assert_eq!(session.remaining_compile_checks, CHECK_ATTEMPT_BUDGET);
        assert_eq!(session.remaining_oracle_checks, CHECK_ATTEMPT_BUDGET);
    }

    #[test]
    fn third_consecutive_spend_is_refused_and_rearms() {
        let mut session = CaseSession::new("case-1");
        assert!(session.try_spend_compile_check());
        assert!(session.try_spend_compile_check());
        assert!(!session.try_spend_compile_check());
        // Refusal re-armed the budget.
        assert!(session.try_spend_compile_check());
        // Oracle budget is independent.
        assert!(session.try_spend_oracle_check());
    }

    #[test]
    fn verified_needs_both_verdicts() {
        let mut session = CaseSession::new("case-1");
        session.oracle_verdict = true;
        assert!(!session.verified());
        session.compile_verdict = true;
        assert!(session.verified());
    }
}
