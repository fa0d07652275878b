//! Routing between agents and tools.
//!
//! Pure functions over the last message and the session, so every path is
//! testable without an agent backend. Control flow never inspects message
//! prose: a pending tool call routes to the executor, verdicts decide
//! termination, and everything else hands the conversation to the other
//! role.

use crate::core::session::CaseSession;
use crate::workflow::messages::{Message, Role};
use crate::workflow::tools::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Execute the pending tool call and return the result to the same role.
    CallTool,
    /// Hand the conversation to the counterpart role.
    Continue,
    /// Both verdicts hold; stop the workflow.
    End,
}

/// Decide what happens after `role` produced `last`.
///
/// Reviewer check calls spend the session's attempt budgets; an exhausted
/// budget refuses the call and forces a hand-over, so the Reviewer can never
/// burn the whole step budget re-running the same check.
pub fn route(role: Role, last: &Message, session: &mut CaseSession) -> Route {
    match &last.tool_call {
        Some(ToolCall::CheckCompile { .. }) if role == Role::Reviewer => {
            if session.try_spend_compile_check() {
                Route::CallTool
            } else {
                Route::Continue
            }
        }
        Some(ToolCall::CheckRefactoring { .. }) if role == Role::Reviewer => {
            if session.try_spend_oracle_check() {
                Route::CallTool
            } else {
                Route::Continue
            }
        }
        Some(_) => Route::CallTool,
        None => {
            if session.verified() {
                Route::End
            } else {
                Route::Continue
            }
        }
    }
}
