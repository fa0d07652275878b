//! Segmentation of agent answers into blocks.
//!
//! The answer protocol separates fields with a fixed run of `#` characters.
//! Each segment is cleaned (markdown fences, field-label placeholders,
//! whitespace) and a trailing segment that is not Java code is treated as
//! commentary and dropped.

use crate::core::java;
use crate::core::types::VerifyError;

/// Separator agents are instructed to place between answer fields.
pub const BLOCK_DELIMITER: &str = "##########################";

/// Placeholder labels agents sometimes echo back instead of filling in.
const FIELD_LABELS: &[&str] = &[
    "target_file_path",
    "refactored_method_code",
    "extract_method_code",
    "moved_method_code",
];

/// Split a raw answer into cleaned blocks.
///
/// Returns at most as many blocks as delimiter-separated segments; empty
/// segments, bare field labels, and a non-code trailing segment are removed.
pub fn parse_blocks(raw: &str) -> Result<Vec<String>, VerifyError> {
    if raw.trim().is_empty() {
        return Err(VerifyError::EmptyInput);
    }

    let mut blocks: Vec<String> = raw
        .split(BLOCK_DELIMITER)
        .map(clean_segment)
        .filter(|segment| !segment.is_empty())
        .filter(|segment| !FIELD_LABELS.contains(&segment.as_str()))
        .collect();

    if let Some(last) = blocks.last()
        && !java::looks_like_method_code(last)
    {
        blocks.pop();
    }

    Ok(blocks)
}

/// Trim a segment and strip at most one enclosing markdown fence.
fn clean_segment(segment: &str) -> String {
    let mut text = segment.trim();
    if let Some(rest) = text.strip_prefix("```java") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    text = text.trim_start();
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}
