//! Dataset load/save with schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::core::case::RefactoringCase;

const CASE_SCHEMA: &str = include_str!("../../schemas/case.schema.json");

/// Load and validate the full dataset.
pub fn load_dataset(path: &Path) -> Result<Vec<RefactoringCase>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read dataset {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse dataset {}", path.display()))?;
    validate_schema(&value)?;
    let cases: Vec<RefactoringCase> = serde_json::from_value(value)
        .with_context(|| format!("deserialize dataset {}", path.display()))?;
    for case in &cases {
        case.validate()?;
    }
    debug!(count = cases.len(), "dataset loaded");
    Ok(cases)
}

/// Write the dataset back, pretty-printed with a trailing newline.
pub fn write_dataset(path: &Path, cases: &[RefactoringCase]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut buf = serde_json::to_string_pretty(cases).context("serialize dataset")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write dataset {}", path.display()))
}

/// Find one case by its unique id.
pub fn find_case<'a>(cases: &'a [RefactoringCase], case_id: &str) -> Result<&'a RefactoringCase> {
    cases
        .iter()
        .find(|case| case.unique_id == case_id)
        .ok_or_else(|| anyhow!("no case with uniqueId {case_id}"))
}

fn validate_schema(dataset: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(CASE_SCHEMA).context("parse embedded case schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {err}"))?;
    if !compiled.is_valid(dataset) {
        let messages = compiled
            .iter_errors(dataset)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "dataset schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::case::sample_case;
    use crate::core::types::RefactoringKind;

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("dataset.json");
        let cases = vec![
            sample_case(RefactoringKind::ExtractMethod),
            sample_case(RefactoringKind::MoveMethod),
        ];
        write_dataset(&path, &cases).expect("write");
        let loaded = load_dataset(&path).expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].kind, RefactoringKind::ExtractMethod);
    }

    #[test]
    fn schema_rejects_missing_required_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("dataset.json");
        fs::write(&path, r#"[{"uniqueId": "x", "type": "Extract Method"}]"#).expect("write");
        let err = load_dataset(&path).unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn schema_rejects_unknown_kinds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("dataset.json");
        let mut value = serde_json::to_value(vec![sample_case(RefactoringKind::ExtractMethod)])
            .expect("to value");
        value[0]["type"] = Value::String("Rename Class".to_string());
        fs::write(&path, value.to_string()).expect("write");
        assert!(load_dataset(&path).is_err());
    }

    #[test]
    fn find_case_by_id() {
        let cases = vec![sample_case(RefactoringKind::ExtractMethod)];
        assert!(find_case(&cases, "commons-lang-42").is_ok());
        assert!(find_case(&cases, "missing").is_err());
    }
}
