//! Import resolution for moved code.
//!
//! When a method moves to another file it takes its imports with it. The
//! resolver is best-effort and total: it proposes import statements the
//! target file is missing, and proposes nothing when unsure.

use std::collections::HashMap;

use crate::core::java;

/// Inputs for one resolution pass.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext<'a> {
    /// The method text landing in the target file.
    pub moved_code: &'a str,
    /// Full origin file text (the imports the method lived among).
    pub origin_text: &'a str,
    /// Full target file text (imports already present).
    pub target_text: &'a str,
    /// Package of the origin file, for same-package sibling candidates.
    pub origin_package: &'a str,
    /// Type names of `.java` files sharing the origin's package.
    pub sibling_types: &'a [String],
}

/// Import statements the target file needs for `moved_code`.
///
/// Static imports first, then plain imports, each group in the order its
/// trigger first appears (origin file order for statics, moved-code scan
/// order for types). Already-present imports are never re-proposed, so
/// resolving against an up-to-date target yields nothing.
pub fn resolve_imports(ctx: &ImportContext<'_>) -> Vec<String> {
    let target_plain = java::plain_imports(ctx.target_text);
    let target_static = java::static_imports(ctx.target_text);
    let target_package = java::package_name(ctx.target_text).unwrap_or_default();
    let target_type = java::primary_type_name(ctx.target_text).unwrap_or_default();

    // Fully-qualified candidates keyed by simple name. Origin imports win
    // over same-package siblings when both exist.
    let mut candidates: HashMap<String, String> = HashMap::new();
    for fq in java::plain_imports(ctx.origin_text) {
        if let Some(simple) = fq.rsplit('.').next() {
            candidates.entry(simple.to_string()).or_insert(fq.clone());
        }
    }
    if !ctx.origin_package.is_empty() {
        for sibling in ctx.sibling_types {
            candidates
                .entry(sibling.clone())
                .or_insert_with(|| format!("{}.{sibling}", ctx.origin_package));
        }
    }

    let mut statements = Vec::new();

    let used_methods = java::used_method_names(ctx.moved_code);
    for fq in java::static_imports(ctx.origin_text) {
        let Some(member) = fq.rsplit('.').next() else {
            continue;
        };
        if used_methods.iter().any(|m| m == member) && !target_static.contains(&fq) {
            statements.push(format!("import static {fq};"));
        }
    }

    for name in java::used_type_names(ctx.moved_code) {
        if name == target_type {
            continue;
        }
        let Some(fq) = candidates.get(&name) else {
            continue;
        };
        if target_plain.contains(fq) {
            continue;
        }
        // Same package as the target: visible without an import.
        if !target_package.is_empty() && *fq == format!("{target_package}.{name}") {
            continue;
        }
        statements.push(format!("import {fq};"));
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "package org.example.core;\n\
        import java.util.List;\n\
        import java.util.Map;\n\
        import org.example.io.Reader;\n\
        import static java.util.Objects.requireNonNull;\n\
        import static java.lang.Math.max;\n\
        \npublic class Origin {\n}\n";

    const TARGET: &str = "package org.example.util;\n\
        import java.util.List;\n\
        \npublic class Target {\n}\n";

    fn ctx<'a>(moved: &'a str, siblings: &'a [String]) -> ImportContext<'a> {
        ImportContext {
            moved_code: moved,
            origin_text: ORIGIN,
            target_text: TARGET,
            origin_package: "org.example.core",
            sibling_types: siblings,
        }
    }

    #[test]
    fn statics_come_first_then_plain_in_discovery_order() {
        let moved = "public static Map<String, Reader> open(List<String> names) {\n\
            requireNonNull(names);\n    int n = max(1, names.size());\n    return null;\n}";
        let imports = resolve_imports(&ctx(moved, &[]));
        assert_eq!(
            imports,
            vec![
                "import static java.util.Objects.requireNonNull;",
                "import static java.lang.Math.max;",
                "import java.util.Map;",
                "import org.example.io.Reader;",
            ]
        );
    }

    #[test]
    fn already_imported_types_are_not_reproposed() {
        let moved = "public static int count(List<String> xs) {\n    return xs.size();\n}";
        // List is already imported in the target.
        assert!(resolve_imports(&ctx(moved, &[])).is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let moved = "public static Map<String, String> index() {\n    return null;\n}";
        let first = resolve_imports(&ctx(moved, &[]));
        assert_eq!(first, vec!["import java.util.Map;"]);

        let mut updated = TARGET.to_string();
        updated = updated.replace(
            "import java.util.List;",
            "import java.util.List;\nimport java.util.Map;",
        );
        let again = resolve_imports(&ImportContext {
            target_text: &updated,
            ..ctx(moved, &[])
        });
        assert!(again.is_empty());
    }

    #[test]
    fn siblings_qualify_under_the_origin_package() {
        let siblings = vec!["Helper".to_string(), "Origin".to_string()];
        let moved = "public static void run() {\n    Helper.go();\n}";
        let imports = resolve_imports(&ctx(moved, &siblings));
        assert_eq!(imports, vec!["import org.example.core.Helper;"]);
    }

    #[test]
    fn unknown_types_and_the_target_itself_are_skipped() {
        let moved = "public static Target wrap(Unknowable u) {\n    return new Target();\n}";
        assert!(resolve_imports(&ctx(moved, &[])).is_empty());
    }

    #[test]
    fn same_package_types_need_no_import() {
        let origin = "package org.example.util;\npublic class Origin {\n}\n";
        let siblings = vec!["Helper".to_string()];
        let moved = "public static void run() {\n    Helper.go();\n}";
        let imports = resolve_imports(&ImportContext {
            moved_code: moved,
            origin_text: origin,
            target_text: TARGET,
            origin_package: "org.example.util",
            sibling_types: &siblings,
        });
        assert!(imports.is_empty());
    }
}
