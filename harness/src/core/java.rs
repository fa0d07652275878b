//! Text heuristics over Java source.
//!
//! Agent answers are free-form text, so everything here is best-effort
//! pattern matching, not parsing. Each helper is total: bad input yields
//! `None`/empty rather than an error.

use std::sync::LazyLock;

use regex::Regex;

static METHOD_SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:public|private|protected|static|final|abstract)\s+[\w<>\[\]]+\s+\w+\s*\([^)]*\)\s*\{")
        .unwrap()
});

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());

static TYPE_DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:class|interface|enum|record)\s+(\w+)").unwrap());

static PLAIN_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+)\s*;").unwrap());

static STATIC_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+static\s+([\w.]+)\s*;").unwrap());

static USED_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\b").unwrap());

static USED_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-z][A-Za-z0-9_]*)\s*\(").unwrap());

static BLOCK_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)//[^\n]*").unwrap());

/// Phrases agents emit instead of complete code.
const LAZY_MARKERS: &[&str] = &[
    "remain unchanged",
    "remains unchanged",
    "remain the same",
    "// other",
    "// rest of",
    "/* other",
    "existing code here",
];

/// Whether a text segment looks like Java method code (has a modifier,
/// a return type, a parameter list, and an opening brace).
pub fn looks_like_method_code(text: &str) -> bool {
    METHOD_SIGNATURE_RE.is_match(text)
}

/// Method name of the first `public static` declaration in `code`.
///
/// Scans the tokens between the modifiers and the first `(`; the name is the
/// last identifier before the parameter list, which also holds for generic
/// return types like `public static <T> List<T> copyOf(`.
pub fn public_static_method_name(code: &str) -> Option<String> {
    let start = code.find("public static")?;
    let rest = &code[start..];
    let paren = rest.find('(')?;
    let head = &rest[..paren];
    head.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Body of the first `class`/`interface`/`enum` declaration in `text`,
/// matched by brace depth so nested blocks stay intact.
pub fn class_body(text: &str) -> Option<&str> {
    let decl = TYPE_DECL_RE.find(text)?;
    let after_decl = &text[decl.end()..];
    let open_rel = after_decl.find('{')?;
    let body_start = decl.end() + open_rel + 1;

    let mut depth = 1usize;
    for (i, ch) in text[body_start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[body_start..body_start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// If `text` wraps a method in a `class X { ... }` shell, return the body;
/// otherwise return `text` unchanged.
pub fn strip_class_wrapper(text: &str) -> &str {
    match class_body(text) {
        Some(body) if !body.trim().is_empty() => body.trim_matches('\n'),
        _ => text,
    }
}

pub fn package_name(text: &str) -> Option<String> {
    PACKAGE_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

pub fn primary_type_name(text: &str) -> Option<String> {
    TYPE_DECL_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Non-static imports, fully qualified, in file order.
pub fn plain_imports(text: &str) -> Vec<String> {
    PLAIN_IMPORT_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Static imports, fully qualified member paths, in file order.
pub fn static_imports(text: &str) -> Vec<String> {
    STATIC_IMPORT_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Capitalized identifiers in first-appearance order, deduplicated.
pub fn used_type_names(code: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in USED_TYPE_RE.captures_iter(code) {
        let name = &caps[1];
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Lowercase identifiers followed by `(`, first-appearance order, deduplicated.
pub fn used_method_names(code: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in USED_CALL_RE.captures_iter(code) {
        let name = &caps[1];
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// First `public static` method declaration in `code`, including its body,
/// matched by brace depth. Used to lift a freshly extracted helper out of
/// replacement code so it can be moved in a follow-up phase.
pub fn extract_public_static_method(code: &str) -> Option<String> {
    let start = code.find("public static")?;
    let after = &code[start..];
    let open_rel = after.find('{')?;
    let mut depth = 0usize;
    for (i, ch) in after[open_rel..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(after[..open_rel + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove block and line comments.
pub fn strip_comments(text: &str) -> String {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(text, "");
    LINE_COMMENT_RE.replace_all(&without_blocks, "").into_owned()
}

/// Whether the code elides parts of the file behind a placeholder phrase.
pub fn looks_lazy(code: &str) -> bool {
    let lowered = code.to_lowercase();
    LAZY_MARKERS.iter().any(|marker| lowered.contains(marker))
}
