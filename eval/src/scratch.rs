//! Per-run scratch directories.
//!
//! Each eval run gets its own directory named with a timestamp and a random
//! suffix, so concurrent or repeated runs never collide.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};

/// Create a fresh run directory under `base_dir`.
pub fn create_run_dir(base_dir: &Path) -> Result<PathBuf> {
    let name = build_run_name(&generate_timestamp(), &generate_short_id());
    let dir = base_dir.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("create run dir {}", dir.display()))?;
    Ok(dir)
}

pub fn build_run_name(timestamp: &str, short_id: &str) -> String {
    format!("run_{timestamp}_{short_id}")
}

fn generate_timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

fn generate_short_id() -> String {
    let mut rng = rand::thread_rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_name_uses_expected_format() {
        let name = build_run_name("20260829_120000", "abc123");
        assert_eq!(name, "run_20260829_120000_abc123");
    }

    #[test]
    fn creates_distinct_directories() {
        let base = tempdir().expect("tempdir");
        let a = create_run_dir(base.path()).expect("run dir");
        let b = create_run_dir(base.path()).expect("run dir");
        assert!(a.is_dir());
        assert!(b.is_dir());
        assert_ne!(a, b);
    }
}
