//! Retrieval seam for the `get_similar_example` tool.
//!
//! The retrieval index is an external collaborator; the workflow only needs
//! "the single best historical example for this code and kind, if any".

use anyhow::Result;

use crate::core::types::RefactoringKind;

pub trait ExampleRetriever {
    fn best_example(&self, source_code: &str, kind: RefactoringKind) -> Result<Option<String>>;
}

/// Retriever used when no index is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetriever;

impl ExampleRetriever for NoRetriever {
    fn best_example(&self, _source_code: &str, _kind: RefactoringKind) -> Result<Option<String>> {
        Ok(None)
    }
}
