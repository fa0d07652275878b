//! Reconstruction of full file texts from answer fields.
//!
//! The dataset stores the method span before the refactoring; answers carry
//! replacement method text. Everything here splices strings in memory; the
//! dispatcher decides what gets written to disk or handed to the oracle.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::VerifyError;

static PACKAGE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+[\w.]+\s*;[^\n]*\n?").unwrap());

/// Replace exactly one occurrence of `span` in `whole` with `replacement`.
///
/// The span must be present verbatim (or verbatim after trimming); a miss is
/// a hard error so a silently-unchanged file can never reach the oracle.
pub fn replace_span(whole: &str, span: &str, replacement: &str) -> Result<String, VerifyError> {
    if whole.contains(span) {
        return Ok(whole.replacen(span, replacement, 1));
    }
    let trimmed = span.trim();
    if !trimmed.is_empty() && whole.contains(trimmed) {
        return Ok(whole.replacen(trimmed, replacement.trim(), 1));
    }
    Err(VerifyError::SpanNotFound {
        needle_head: span_head(span),
    })
}

fn span_head(span: &str) -> String {
    let first_line = span.trim().lines().next().unwrap_or_default();
    let mut head: String = first_line.chars().take(60).collect();
    if head.len() < first_line.len() {
        head.push_str("...");
    }
    head
}

/// Insert `method` before the final closing brace of `target_whole`.
pub fn insert_method_into_class(target_whole: &str, method: &str) -> Result<String, VerifyError> {
    let Some(brace) = target_whole.rfind('}') else {
        return Err(VerifyError::ValidationFailed(
            "the target file has no class body to receive the moved method".to_string(),
        ));
    };
    let mut out = String::with_capacity(target_whole.len() + method.len() + 2);
    out.push_str(target_whole[..brace].trim_end_matches([' ', '\t']));
    out.push('\n');
    out.push_str(method.trim_matches('\n'));
    out.push('\n');
    out.push_str(&target_whole[brace..]);
    Ok(out)
}

/// Insert import statements after the package declaration, or at the top of
/// the file when there is none. Already-present statements are skipped.
pub fn insert_imports(file_text: &str, imports: &[String]) -> String {
    let missing: Vec<&String> = imports
        .iter()
        .filter(|stmt| !file_text.contains(stmt.as_str()))
        .collect();
    if missing.is_empty() {
        return file_text.to_string();
    }

    let mut block = String::new();
    for stmt in missing {
        block.push_str(stmt);
        block.push('\n');
    }

    match PACKAGE_LINE_RE.find(file_text) {
        Some(m) => {
            let mut out = String::with_capacity(file_text.len() + block.len() + 1);
            out.push_str(&file_text[..m.end()]);
            out.push('\n');
            out.push_str(&block);
            out.push_str(&file_text[m.end()..]);
            out
        }
        None => format!("{block}{file_text}"),
    }
}

/// Reconstructed file pair for dual-file kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEdit {
    /// Origin file with the caller rewritten; what gets recorded and built.
    pub origin_text: String,
    /// Origin file as the oracle sees it.
    pub origin_text_for_oracle: String,
    /// Target file with the method injected and imports added.
    pub target_text: String,
}

/// Inputs for reconstructing a dual-file edit.
#[derive(Debug, Clone, Copy)]
pub struct MoveInputs<'a> {
    pub origin_whole: &'a str,
    /// Method span being moved (or extracted from), as stored in the case.
    pub span_before: &'a str,
    pub caller_code: &'a str,
    pub moved_code: &'a str,
    pub target_whole: &'a str,
    pub imports: &'a [String],
    /// Fully-qualified target class, imported into the origin when the
    /// rewritten caller references it across packages.
    pub target_class_import: Option<&'a str>,
}

/// Reconstruct both files for Move Method / Move And Rename Method.
///
/// The oracle variant removes the span outright: detection compares "method
/// gone from origin, present in target", while the recorded origin keeps the
/// rewritten caller.
pub fn move_edit(inputs: &MoveInputs<'_>) -> Result<MoveEdit, VerifyError> {
    let origin_text = origin_with_caller(inputs)?;
    let origin_text_for_oracle = replace_span(inputs.origin_whole, inputs.span_before, "")?;
    Ok(MoveEdit {
        origin_text,
        origin_text_for_oracle,
        target_text: target_with_method(inputs)?,
    })
}

/// Reconstruct both files for Extract And Move Method.
///
/// The caller survives extraction, so the oracle sees the same origin text
/// that gets recorded.
pub fn extract_move_edit(inputs: &MoveInputs<'_>) -> Result<MoveEdit, VerifyError> {
    let origin_text = origin_with_caller(inputs)?;
    Ok(MoveEdit {
        origin_text_for_oracle: origin_text.clone(),
        origin_text,
        target_text: target_with_method(inputs)?,
    })
}

fn origin_with_caller(inputs: &MoveInputs<'_>) -> Result<String, VerifyError> {
    let replaced = replace_span(inputs.origin_whole, inputs.span_before, inputs.caller_code)?;
    match inputs.target_class_import {
        Some(fq) => Ok(insert_imports(&replaced, &[format!("import {fq};")])),
        None => Ok(replaced),
    }
}

fn target_with_method(inputs: &MoveInputs<'_>) -> Result<String, VerifyError> {
    let injected = insert_method_into_class(inputs.target_whole, inputs.moved_code)?;
    Ok(insert_imports(&injected, inputs.imports))
}
