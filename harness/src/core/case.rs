//! Dataset case records.
//!
//! Records are consumed and produced in the dataset's own JSON layout
//! (camelCase field names). Result fields are appended in place; fields this
//! harness does not understand round-trip untouched through `extra`.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::RefactoringKind;

/// One refactoring case from the experiment dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactoringCase {
    pub unique_id: String,

    /// Refactoring operation kind, e.g. `"Extract Method"`.
    #[serde(rename = "type")]
    pub kind: RefactoringKind,

    /// Origin file path relative to the project root.
    pub file_path_before: String,

    /// The method body the refactoring targets (the span to replace).
    pub source_code_before_refactoring: String,

    /// Full text of the origin file before the refactoring.
    pub source_code_before_for_whole: String,

    /// Commit at which the refactoring was originally performed.
    pub commit_id: String,

    /// JDK version string the project builds with at that commit.
    #[serde(rename = "compileJDK", default = "default_jdk")]
    pub compile_jdk: String,

    #[serde(default)]
    pub package_name_before: String,

    #[serde(default)]
    pub method_name_before: String,

    /// For inline kinds, the method being inlined into its caller.
    #[serde(default)]
    pub invoked_method: String,

    // Result fields, appended after a run. Absent on fresh datasets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_refactored_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_and_test_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_chat_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_refactored_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_compile_and_test_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_chat_log: Option<String>,

    /// Dataset fields this harness does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_jdk() -> String {
    "17".to_string()
}

impl RefactoringCase {
    pub fn validate(&self) -> Result<()> {
        if self.unique_id.trim().is_empty() {
            return Err(anyhow!("case uniqueId must be non-empty"));
        }
        if !self.file_path_before.ends_with(".java") {
            return Err(anyhow!(
                "case {}: filePathBefore must point at a .java file, got {}",
                self.unique_id,
                self.file_path_before
            ));
        }
        if self.source_code_before_for_whole.trim().is_empty() {
            return Err(anyhow!(
                "case {}: sourceCodeBeforeForWhole must be non-empty",
                self.unique_id
            ));
        }
        if self.source_code_before_refactoring.trim().is_empty() {
            return Err(anyhow!(
                "case {}: sourceCodeBeforeRefactoring must be non-empty",
                self.unique_id
            ));
        }
        Ok(())
    }

    /// Absolute path of the origin file inside the checked-out project.
    pub fn origin_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.file_path_before)
    }

    pub fn verified(&self) -> bool {
        self.oracle_result == Some(true) && self.compile_and_test_result == Some(true)
    }
}

#[cfg(test)]
pub(crate) fn sample_case(kind: RefactoringKind) -> RefactoringCase {
    RefactoringCase {
        unique_id: "commons-lang-42".to_string(),
        kind,
        file_path_before: "src/main/java/org/example/Widget.java".to_string(),
        source_code_before_refactoring: "    public int area() {\n        return w * h;\n    }"
            .to_string(),
        source_code_before_for_whole: "package org.example;\n\npublic class Widget {\n    int w;\n    int h;\n\n    public int area() {\n        return w * h;\n    }\n}\n"
            .to_string(),
        commit_id: "deadbeef".to_string(),
        compile_jdk: "17".to_string(),
        package_name_before: "org.example".to_string(),
        method_name_before: "area".to_string(),
        invoked_method: String::new(),
        agent_refactored_code: None,
        oracle_result: None,
        compile_and_test_result: None,
        agent_chat_log: None,
        error_log: None,
        repair_refactored_code: None,
        repair_compile_and_test_result: None,
        repair_chat_log: None,
        extra: serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dataset_record_field_names() {
        let json = r#"{
            "uniqueId": "guava-7",
            "type": "Extract Method",
            "filePathBefore": "src/main/java/A.java",
            "sourceCodeBeforeRefactoring": "public void a() {}",
            "sourceCodeBeforeForWhole": "class A { public void a() {} }",
            "commitId": "abc123",
            "compileJDK": "11",
            "packageNameBefore": "com.example",
            "methodNameBefore": "a",
            "description": "kept but uninterpreted"
        }"#;
        let case: RefactoringCase = serde_json::from_str(json).expect("parse case");
        assert_eq!(case.unique_id, "guava-7");
        assert_eq!(case.kind, RefactoringKind::ExtractMethod);
        assert_eq!(case.compile_jdk, "11");
        assert!(case.extra.contains_key("description"));
        case.validate().expect("valid");
    }

    #[test]
    fn result_fields_serialize_camel_case_and_skip_when_absent() {
        let mut case = sample_case(RefactoringKind::MoveMethod);
        let fresh = serde_json::to_string(&case).expect("serialize");
        assert!(!fresh.contains("agentRefactoredCode"));

        case.agent_refactored_code = Some("class B {}".to_string());
        case.oracle_result = Some(true);
        case.compile_and_test_result = Some(false);
        let json = serde_json::to_string(&case).expect("serialize");
        assert!(json.contains("\"agentRefactoredCode\""));
        assert!(json.contains("\"oracleResult\":true"));
        assert!(json.contains("\"compileAndTestResult\":false"));
    }

    #[test]
    fn rejects_non_java_origin_path() {
        let mut case = sample_case(RefactoringKind::ExtractMethod);
        case.file_path_before = "src/main/scala/A.scala".to_string();
        assert!(case.validate().is_err());
    }
}
