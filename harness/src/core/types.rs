//! Shared verification types: refactoring kinds, verdicts, and the error
//! taxonomy relayed back to agents as plain text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Refactoring operation kinds as they appear in dataset records.
///
/// The serde names are the exact dataset strings, so an unknown kind fails at
/// deserialization rather than deep inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RefactoringKind {
    #[serde(rename = "Extract Method")]
    ExtractMethod,
    #[serde(rename = "Inline Method")]
    InlineMethod,
    #[serde(rename = "Move Method")]
    MoveMethod,
    #[serde(rename = "Move And Rename Method")]
    MoveAndRenameMethod,
    #[serde(rename = "Extract And Move Method")]
    ExtractAndMoveMethod,
    #[serde(rename = "Move And Inline Method")]
    MoveAndInlineMethod,
}

impl RefactoringKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExtractMethod => "Extract Method",
            Self::InlineMethod => "Inline Method",
            Self::MoveMethod => "Move Method",
            Self::MoveAndRenameMethod => "Move And Rename Method",
            Self::ExtractAndMoveMethod => "Extract And Move Method",
            Self::MoveAndInlineMethod => "Move And Inline Method",
        }
    }

    /// Kinds whose answers carry a target file alongside the origin file.
    pub fn is_move_family(self) -> bool {
        matches!(
            self,
            Self::MoveMethod | Self::MoveAndRenameMethod | Self::ExtractAndMoveMethod
        )
    }

    /// Kinds the pipeline refuses to verify.
    pub fn is_supported(self) -> bool {
        self != Self::MoveAndInlineMethod
    }
}

impl fmt::Display for RefactoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict triple for one verification pass.
///
/// Both verdicts start false; a case counts as verified only when both hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub oracle_verdict: bool,
    pub compile_verdict: bool,
    pub resulting_code: String,
}

impl VerificationOutcome {
    pub fn verified(&self) -> bool {
        self.oracle_verdict && self.compile_verdict
    }
}

/// Verification failures.
///
/// These are values, not panics: the Reviewer relays the rendered message to
/// the Developer verbatim, so every variant formats as an actionable sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The agent response was blank.
    EmptyInput,
    /// The response did not contain the blocks the kind requires.
    MalformedResponse(String),
    /// Blocks were present but failed a structural check.
    ValidationFailed(String),
    /// The expected before-span was not found in the enclosing file text.
    SpanNotFound { needle_head: String },
    /// The kind has no verification procedure.
    UnsupportedKind(RefactoringKind),
    /// The detection oracle exited abnormally.
    OracleExecutionFailed(String),
    /// The candidate code did not compile.
    CompileFailed(String),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "the response is empty; provide the refactored code"),
            Self::MalformedResponse(msg) => write!(f, "incomplete answer: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "invalid answer: {msg}"),
            Self::SpanNotFound { needle_head } => write!(
                f,
                "the original method body was not found in the enclosing file \
                 (expected span starting with `{needle_head}`)"
            ),
            Self::UnsupportedKind(kind) => {
                write!(f, "the {kind} operation is not supported by the verifier")
            }
            Self::OracleExecutionFailed(msg) => {
                write!(f, "the refactoring detection tool failed to run: {msg}")
            }
            Self::CompileFailed(msg) => write!(f, "the refactored code failed to compile: {msg}"),
        }
    }
}

impl std::error::Error for VerifyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_dataset_strings() {
        let json = "\"Move And Rename Method\"";
        let kind: RefactoringKind = serde_json::from_str(json).expect("parse kind");
        assert_eq!(kind, RefactoringKind::MoveAndRenameMethod);
        assert_eq!(serde_json::to_string(&kind).expect("serialize"), json);
    }

    #[test]
    fn unknown_kind_string_is_rejected() {
        let err = serde_json::from_str::<RefactoringKind>("\"Rename Class\"");
        assert!(err.is_err());
    }

    #[test]
    fn move_family_membership() {
        assert!(RefactoringKind::MoveMethod.is_move_family());
        assert!(RefactoringKind::ExtractAndMoveMethod.is_move_family());
        assert!(!RefactoringKind::ExtractMethod.is_move_family());
        assert!(!RefactoringKind::MoveAndInlineMethod.is_move_family());
    }

    #[test]
    fn default_outcome_is_unverified() {
        let outcome = VerificationOutcome::default();
        assert!(!outcome.verified());
        assert!(outcome.resulting_code.is_empty());
    }
}
