//! Field extraction: map cleaned answer blocks onto the fields each
//! refactoring kind requires, with structural validation.

use crate::core::blocks;
use crate::core::java;
use crate::core::types::{RefactoringKind, VerifyError};

/// Answer meaning "the method is already in its best form".
pub const NO_CHANGE_SENTINEL: &str = "no need to refactor.";

/// Fields recovered from an agent answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedFields {
    /// The agent declined to refactor; the case is trivially verified.
    NoChangeNeeded,
    /// Single-file kinds: the rewritten method for the origin file.
    Single { refactored_code: String },
    /// Dual-file kinds: where the method goes, the method itself, and the
    /// rewritten caller left behind in the origin file.
    Move {
        target_file_path: String,
        moved_code: String,
        caller_code: String,
    },
}

/// Extract and validate the fields `kind` requires from a raw answer.
pub fn extract_fields(kind: RefactoringKind, raw: &str) -> Result<ExtractedFields, VerifyError> {
    if raw.trim().eq_ignore_ascii_case(NO_CHANGE_SENTINEL) {
        return Ok(ExtractedFields::NoChangeNeeded);
    }
    match kind {
        RefactoringKind::ExtractMethod | RefactoringKind::InlineMethod => extract_single(raw),
        RefactoringKind::MoveMethod
        | RefactoringKind::MoveAndRenameMethod
        | RefactoringKind::ExtractAndMoveMethod => extract_move(kind, raw),
        RefactoringKind::MoveAndInlineMethod => Err(VerifyError::UnsupportedKind(kind)),
    }
}

fn extract_single(raw: &str) -> Result<ExtractedFields, VerifyError> {
    let parsed = blocks::parse_blocks(raw)?;
    // The refactored method is the last useful block; leading blocks are
    // commentary or intermediate snippets.
    let Some(refactored_code) = parsed.into_iter().next_back() else {
        return Err(VerifyError::MalformedResponse(
            "the answer must contain the refactored method code".to_string(),
        ));
    };
    Ok(ExtractedFields::Single { refactored_code })
}

fn extract_move(kind: RefactoringKind, raw: &str) -> Result<ExtractedFields, VerifyError> {
    let parsed = blocks::parse_blocks(raw)?;
    if parsed.len() < 3 {
        return Err(VerifyError::MalformedResponse(
            "the answer must contain the target file path, the moved method, \
             and the refactored caller method"
                .to_string(),
        ));
    }
    // Right-aligned: preambles before the three answer fields are ignored.
    let caller_code = parsed[parsed.len() - 1].clone();
    let moved_raw = &parsed[parsed.len() - 2];
    let target_file_path = parsed[parsed.len() - 3].clone();

    if !target_file_path.ends_with(".java") {
        return Err(VerifyError::ValidationFailed(format!(
            "the target file path must end with .java, got `{target_file_path}`"
        )));
    }

    // Pure-move answers sometimes wrap the method in a class shell; the
    // extract-and-move protocol hands the method over as-is.
    let moved_code = if kind == RefactoringKind::ExtractAndMoveMethod {
        moved_raw.clone()
    } else {
        java::strip_class_wrapper(moved_raw).to_string()
    };
    if !moved_code.contains("public static") {
        return Err(VerifyError::ValidationFailed(
            "the moved method must be declared public static".to_string(),
        ));
    }

    let Some(method_name) = java::public_static_method_name(&moved_code) else {
        return Err(VerifyError::ValidationFailed(
            "could not determine the moved method's name".to_string(),
        ));
    };
    if !caller_code.contains(&method_name) {
        return Err(VerifyError::ValidationFailed(format!(
            "the refactored caller method must invoke the moved method `{method_name}`"
        )));
    }

    Ok(ExtractedFields::Move {
        target_file_path,
        moved_code,
        caller_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blocks::BLOCK_DELIMITER;

    const MOVED: &str =
        "public static int area(int w, int h) {\n    return w * h;\n}";
    const CALLER: &str =
        "public int describe() {\n    return Geometry.area(this.w, this.h);\n}";

    fn move_answer(target: &str, moved: &str, caller: &str) -> String {
        format!("{target}\n{BLOCK_DELIMITER}\n{moved}\n{BLOCK_DELIMITER}\n{caller}")
    }

    #[test]
    fn sentinel_is_case_insensitive() {
        for raw in ["no need to refactor.", "No need to refactor.", "NO NEED TO REFACTOR."] {
            let fields =
                extract_fields(RefactoringKind::MoveMethod, raw).expect("sentinel accepted");
            assert_eq!(fields, ExtractedFields::NoChangeNeeded);
        }
        // Without the trailing period it is an ordinary (malformed) answer.
        assert!(extract_fields(RefactoringKind::MoveMethod, "no need to refactor").is_err());
    }

    #[test]
    fn extract_method_takes_the_last_block() {
        let raw = format!(
            "I extracted the area computation.\n{BLOCK_DELIMITER}\n```java\n{MOVED}\n```"
        );
        let fields = extract_fields(RefactoringKind::ExtractMethod, &raw).expect("fields");
        assert_eq!(
            fields,
            ExtractedFields::Single {
                refactored_code: MOVED.to_string()
            }
        );
    }

    #[test]
    fn move_requires_three_blocks() {
        let raw = format!("src/main/java/Geometry.java\n{BLOCK_DELIMITER}\n{MOVED}");
        let err = extract_fields(RefactoringKind::MoveMethod, &raw).unwrap_err();
        assert!(matches!(err, VerifyError::MalformedResponse(_)), "got {err:?}");
    }

    #[test]
    fn move_blocks_are_right_aligned() {
        let raw = format!(
            "Some preamble text that is dropped by nothing in particular.\n{d}\nsrc/main/java/Geometry.java\n{d}\n{MOVED}\n{d}\n{CALLER}",
            d = BLOCK_DELIMITER
        );
        let fields = extract_fields(RefactoringKind::MoveMethod, &raw).expect("fields");
        let ExtractedFields::Move { target_file_path, moved_code, caller_code } = fields else {
            panic!("expected move fields");
        };
        assert_eq!(target_file_path, "src/main/java/Geometry.java");
        assert_eq!(moved_code, MOVED);
        assert_eq!(caller_code, CALLER);
    }

    #[test]
    fn move_target_must_be_java_file() {
        let raw = move_answer("src/main/java/Geometry.kt", MOVED, CALLER);
        let err = extract_fields(RefactoringKind::MoveMethod, &raw).unwrap_err();
        assert!(matches!(err, VerifyError::ValidationFailed(_)), "got {err:?}");
    }

    #[test]
    fn moved_method_must_be_public_static() {
        let moved = "public int area(int w, int h) {\n    return w * h;\n}";
        let raw = move_answer("src/main/java/Geometry.java", moved, CALLER);
        let err = extract_fields(RefactoringKind::MoveMethod, &raw).unwrap_err();
        let VerifyError::ValidationFailed(msg) = err else {
            panic!("expected validation failure");
        };
        assert!(msg.contains("public static"));
    }

    #[test]
    fn caller_must_mention_moved_method_name() {
        let caller = "public int describe() {\n    return 0;\n}";
        let raw = move_answer("src/main/java/Geometry.java", MOVED, caller);
        let err = extract_fields(RefactoringKind::MoveMethod, &raw).unwrap_err();
        let VerifyError::ValidationFailed(msg) = err else {
            panic!("expected validation failure");
        };
        assert!(msg.contains("area"));
    }

    #[test]
    fn class_wrapper_around_moved_method_is_stripped() {
        let wrapped = format!("public class Geometry {{\n{MOVED}\n}}");
        let raw = move_answer("src/main/java/Geometry.java", &wrapped, CALLER);
        let fields = extract_fields(RefactoringKind::MoveAndRenameMethod, &raw).expect("fields");
        let ExtractedFields::Move { moved_code, .. } = fields else {
            panic!("expected move fields");
        };
        assert_eq!(moved_code.trim(), MOVED);
    }

    #[test]
    fn extract_and_move_keeps_the_extracted_block_as_given() {
        let wrapped = format!("public class Geometry {{\n{MOVED}\n}}");
        let raw = move_answer("src/main/java/Geometry.java", &wrapped, CALLER);
        let fields = extract_fields(RefactoringKind::ExtractAndMoveMethod, &raw).expect("fields");
        let ExtractedFields::Move { moved_code, .. } = fields else {
            panic!("expected move fields");
        };
        assert_eq!(moved_code, wrapped);
    }

    #[test]
    fn move_and_inline_is_unsupported() {
        let raw = move_answer("src/main/java/Geometry.java", MOVED, CALLER);
        let err = extract_fields(RefactoringKind::MoveAndInlineMethod, &raw).unwrap_err();
        assert_eq!(
            err,
            VerifyError::UnsupportedKind(RefactoringKind::MoveAndInlineMethod)
        );
    }
}
