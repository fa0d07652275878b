//! Same-package sibling scan for import candidates.
//!
//! Types living next to the origin file are importable by the moved method
//! under the origin package, even though the origin file never imports them.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

/// Source roots checked for the origin's package directory.
const SOURCE_ROOTS: &[&str] = &["src/main/java", "src/test/java"];

/// Type names of `.java` files sharing the origin file's package.
///
/// The origin path is rel to the project root and must live under one of the
/// standard source roots; everything else yields an empty list. Names are
/// sorted so resolution stays deterministic across filesystems.
pub fn same_package_types(project_dir: &Path, origin_rel_path: &str) -> Result<Vec<String>> {
    let Some(package_rel) = package_relative_dir(origin_rel_path) else {
        return Ok(Vec::new());
    };

    let mut names = Vec::new();
    for root in SOURCE_ROOTS {
        let dir = project_dir.join(root).join(package_rel);
        if !dir.is_dir() {
            continue;
        }
        for entry in dir.read_dir()? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(base) = file_name.to_string_lossy().strip_suffix(".java").map(str::to_string)
            else {
                continue;
            };
            if !names.contains(&base) {
                names.push(base);
            }
        }
    }
    names.sort();
    debug!(count = names.len(), "sibling types scanned");
    Ok(names)
}

/// Package directory of a source file, rel to its source root.
fn package_relative_dir(origin_rel_path: &str) -> Option<&str> {
    let parent = Path::new(origin_rel_path).parent()?.to_str()?;
    for root in SOURCE_ROOTS {
        if let Some(stripped) = parent.strip_prefix(root) {
            return Some(stripped.trim_start_matches('/'));
        }
    }
    None
}
