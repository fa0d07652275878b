//! Verification dispatcher: from a raw agent answer to a verdict pair.
//!
//! Every kind follows the same shape: extract fields, reconstruct the full
//! file text(s), ask the oracle whether the refactoring happened, then check
//! that the result compiles. Failures along the way become messages for the
//! Reviewer to relay, never panics.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::case::RefactoringCase;
use crate::core::fields::{ExtractedFields, extract_fields};
use crate::core::imports::{ImportContext, resolve_imports};
use crate::core::java;
use crate::core::reconstruct::{MoveInputs, extract_move_edit, move_edit, replace_span};
use crate::core::types::{RefactoringKind, VerificationOutcome, VerifyError};
use crate::io::artifacts;
use crate::io::build::{BuildDriver, BuildRequest, target_file_exists};
use crate::io::git::Git;
use crate::io::oracle::{Oracle, OracleRequest, OracleTarget};
use crate::io::siblings::same_package_types;

/// Positions the project tree at the commit preceding a case's refactoring.
///
/// A seam so dispatcher tests can lay out the tree themselves.
pub trait TreePositioner {
    fn position_before(&self, commit: &str) -> Result<()>;
}

/// Real positioner backed by git.
#[derive(Debug, Clone)]
pub struct GitPositioner {
    git: Git,
}

impl GitPositioner {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            git: Git::new(project_dir.into()),
        }
    }
}

impl TreePositioner for GitPositioner {
    fn position_before(&self, commit: &str) -> Result<()> {
        self.git.checkout_before(commit)?;
        Ok(())
    }
}

/// Which checks one verification pass performs.
///
/// The Reviewer's tools check one facet at a time; the offline `verify`
/// command and the eval driver run both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckScope {
    OracleOnly,
    CompileOnly,
    Full,
}

impl CheckScope {
    fn wants_oracle(self) -> bool {
        self != Self::CompileOnly
    }

    fn wants_compile(self) -> bool {
        self != Self::OracleOnly
    }
}

/// Dispatcher dependencies, all seams.
pub struct Verifier<'a> {
    pub oracle: &'a dyn Oracle,
    pub builder: &'a dyn BuildDriver,
    pub positioner: &'a dyn TreePositioner,
    pub project_dir: &'a Path,
    pub artifacts_dir: &'a Path,
}

/// Verdicts plus the message the Reviewer relays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub outcome: VerificationOutcome,
    pub message: String,
    /// Filtered build log when the compile check failed.
    pub error_log: String,
}

impl VerifyReport {
    fn rejected(message: String) -> Self {
        Self {
            outcome: VerificationOutcome::default(),
            message,
            error_log: String::new(),
        }
    }
}

impl Verifier<'_> {
    /// Verify one raw answer against its case, running both checks.
    pub fn verify_answer(&self, case: &RefactoringCase, raw_answer: &str) -> Result<VerifyReport> {
        self.verify_answer_scoped(case, raw_answer, CheckScope::Full)
    }

    /// Verify one raw answer against its case.
    #[instrument(skip_all, fields(case_id = %case.unique_id, kind = %case.kind, ?scope))]
    pub fn verify_answer_scoped(
        &self,
        case: &RefactoringCase,
        raw_answer: &str,
        scope: CheckScope,
    ) -> Result<VerifyReport> {
        let fields = match extract_fields(case.kind, raw_answer) {
            Ok(fields) => fields,
            Err(err) => {
                debug!(err = %err, "answer rejected before any external check");
                return Ok(VerifyReport::rejected(err.to_string()));
            }
        };

        match fields {
            ExtractedFields::NoChangeNeeded => {
                info!("agent declined to refactor; trivially verified");
                Ok(VerifyReport {
                    outcome: VerificationOutcome {
                        oracle_verdict: true,
                        compile_verdict: true,
                        resulting_code: case.source_code_before_for_whole.clone(),
                    },
                    message: "no refactoring was needed; the original code stands".to_string(),
                    error_log: String::new(),
                })
            }
            ExtractedFields::Single { refactored_code } => {
                self.verify_single(case, &refactored_code, scope)
            }
            ExtractedFields::Move {
                target_file_path,
                moved_code,
                caller_code,
            } => self.verify_move(case, &target_file_path, &moved_code, &caller_code, scope),
        }
    }

    fn verify_single(
        &self,
        case: &RefactoringCase,
        refactored_code: &str,
        scope: CheckScope,
    ) -> Result<VerifyReport> {
        let origin_after = match replace_span(
            &case.source_code_before_for_whole,
            &case.source_code_before_refactoring,
            refactored_code,
        ) {
            Ok(text) => text,
            Err(err) => return Ok(VerifyReport::rejected(err.to_string())),
        };

        let mut messages = Vec::new();
        let mut oracle_verdict = false;
        if scope.wants_oracle() {
            match self.oracle.check(&OracleRequest {
                kind: case.kind,
                origin_path: &case.file_path_before,
                origin_before: &case.source_code_before_for_whole,
                origin_after: &origin_after,
                target: None,
            }) {
                Ok(verdict) => {
                    oracle_verdict = verdict.detected;
                    messages.push(verdict.report);
                }
                Err(err) => return Ok(self.oracle_failure_report(err)),
            }
        }

        let mut compile_verdict = false;
        let mut error_log = String::new();
        if scope.wants_compile() {
            let (verdict, log) = self
                .compile_check(case, &[(case.file_path_before.clone(), origin_after.clone())])?;
            compile_verdict = verdict;
            error_log = log;
            messages.push(if verdict {
                "the refactored code compiled".to_string()
            } else {
                "the refactored code failed to compile".to_string()
            });
        }

        Ok(VerifyReport {
            outcome: VerificationOutcome {
                oracle_verdict,
                compile_verdict,
                resulting_code: origin_after,
            },
            message: messages.join("; "),
            error_log,
        })
    }

    fn verify_move(
        &self,
        case: &RefactoringCase,
        target_file_path: &str,
        moved_code: &str,
        caller_code: &str,
        scope: CheckScope,
    ) -> Result<VerifyReport> {
        self.positioner.position_before(&case.commit_id)?;

        if !target_file_exists(self.project_dir, target_file_path) {
            warn!(target_file_path, "claimed target file is absent");
            return Ok(VerifyReport::rejected(format!(
                "the target file `{target_file_path}` does not exist in the project"
            )));
        }
        let target_full = self.project_dir.join(target_file_path);
        let target_whole = fs::read_to_string(&target_full)
            .map_err(|err| anyhow::anyhow!("read target {}: {err}", target_full.display()))?;

        let sibling_types = same_package_types(self.project_dir, &case.file_path_before)?;
        let imports = resolve_imports(&ImportContext {
            moved_code,
            origin_text: &case.source_code_before_for_whole,
            target_text: &target_whole,
            origin_package: &case.package_name_before,
            sibling_types: &sibling_types,
        });
        let target_class_import = cross_package_import(case, &target_whole);

        let inputs = MoveInputs {
            origin_whole: &case.source_code_before_for_whole,
            span_before: &case.source_code_before_refactoring,
            caller_code,
            moved_code,
            target_whole: &target_whole,
            imports: &imports,
            target_class_import: target_class_import.as_deref(),
        };
        let edit = match case.kind {
            RefactoringKind::ExtractAndMoveMethod => extract_move_edit(&inputs),
            _ => move_edit(&inputs),
        };
        let edit = match edit {
            Ok(edit) => edit,
            Err(err) => return Ok(VerifyReport::rejected(err.to_string())),
        };

        let mut messages = Vec::new();
        let mut oracle_verdict = false;
        if scope.wants_oracle() {
            match self.oracle.check(&OracleRequest {
                kind: case.kind,
                origin_path: &case.file_path_before,
                origin_before: &case.source_code_before_for_whole,
                origin_after: &edit.origin_text_for_oracle,
                target: Some(OracleTarget {
                    target_path: target_file_path,
                    target_after: &edit.target_text,
                }),
            }) {
                Ok(verdict) => {
                    oracle_verdict = verdict.detected;
                    messages.push(verdict.report);
                }
                Err(err) => return Ok(self.oracle_failure_report(err)),
            }
        }

        // Moving into an existing file rarely breaks the build; the compile
        // check is structural for pure moves. Extract-and-move rewrites the
        // origin enough to warrant a real build.
        let mut compile_verdict = false;
        let mut error_log = String::new();
        if scope.wants_compile() {
            if case.kind == RefactoringKind::ExtractAndMoveMethod {
                let (verdict, log) = self.compile_check(
                    case,
                    &[(case.file_path_before.clone(), edit.origin_text.clone())],
                )?;
                compile_verdict = verdict;
                error_log = log;
            } else {
                compile_verdict = true;
            }
            messages.push(if compile_verdict {
                "the refactored code compiled".to_string()
            } else {
                "the refactored code failed to compile".to_string()
            });
        }

        Ok(VerifyReport {
            outcome: VerificationOutcome {
                oracle_verdict,
                compile_verdict,
                resulting_code: edit.origin_text,
            },
            message: messages.join("; "),
            error_log,
        })
    }

    /// Run the build and preserve failure artifacts.
    fn compile_check(
        &self,
        case: &RefactoringCase,
        file_edits: &[(String, String)],
    ) -> Result<(bool, String)> {
        let report = self.builder.build(&BuildRequest {
            commit_id: &case.commit_id,
            jdk: &case.compile_jdk,
            file_edits,
        })?;
        if report.compiled() {
            return Ok((true, String::new()));
        }
        if let Some((_, candidate)) = file_edits.first() {
            artifacts::write_failure(
                self.artifacts_dir,
                &case.unique_id,
                candidate,
                &report.error_log,
            )?;
        }
        Ok((false, report.error_log))
    }

    fn oracle_failure_report(&self, err: anyhow::Error) -> VerifyReport {
        warn!(err = %err, "oracle execution failed");
        let message = match err.downcast_ref::<VerifyError>() {
            Some(verify_err) => verify_err.to_string(),
            None => format!("the refactoring detection tool failed to run: {err:#}"),
        };
        VerifyReport::rejected(message)
    }
}

/// Import the target class into the origin when the rewritten caller refers
/// to it across packages.
fn cross_package_import(case: &RefactoringCase, target_whole: &str) -> Option<String> {
    let target_package = java::package_name(target_whole)?;
    let target_class = java::primary_type_name(target_whole)?;
    if target_package == case.package_name_before {
        return None;
    }
    Some(format!("{target_package}.{target_class}"))
}
