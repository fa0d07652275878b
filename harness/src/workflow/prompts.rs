//! Prompt rendering for agent roles and case openings.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::blocks::BLOCK_DELIMITER;
use crate::core::case::RefactoringCase;
use crate::workflow::messages::Role;

const DEVELOPER_TEMPLATE: &str = include_str!("prompts/developer.md");
const REVIEWER_TEMPLATE: &str = include_str!("prompts/reviewer.md");
const REPAIRER_TEMPLATE: &str = include_str!("prompts/repairer.md");
const OPENING_TEMPLATE: &str = include_str!("prompts/opening.md");
const REPAIR_OPENING_TEMPLATE: &str = include_str!("prompts/repair_opening.md");

fn engine() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template("developer", DEVELOPER_TEMPLATE)
        .expect("developer template should be valid");
    env.add_template("reviewer", REVIEWER_TEMPLATE)
        .expect("reviewer template should be valid");
    env.add_template("repairer", REPAIRER_TEMPLATE)
        .expect("repairer template should be valid");
    env.add_template("opening", OPENING_TEMPLATE)
        .expect("opening template should be valid");
    env.add_template("repair_opening", REPAIR_OPENING_TEMPLATE)
        .expect("repair opening template should be valid");
    env
}

/// System prompt for an agent role.
pub fn system_prompt(role: Role) -> Result<String> {
    let env = engine();
    let name = match role {
        Role::Developer => "developer",
        Role::Reviewer => "reviewer",
        Role::Repairer => "repairer",
    };
    let template = env.get_template(name)?;
    template
        .render(context! { delimiter => BLOCK_DELIMITER })
        .with_context(|| format!("render {name} prompt"))
}

/// Opening message seeding the main workflow for one case.
pub fn opening_prompt(case: &RefactoringCase) -> Result<String> {
    let env = engine();
    let template = env.get_template("opening")?;
    template
        .render(context! {
            case_id => case.unique_id,
            kind => case.kind.as_str(),
            file_path => case.file_path_before,
            method_code => case.source_code_before_refactoring.trim_end(),
        })
        .context("render opening prompt")
}

/// Opening message seeding the repair workflow.
pub fn repair_opening_prompt(case_id: &str, buggy_code: &str, error_log: &str) -> Result<String> {
    let env = engine();
    let template = env.get_template("repair_opening")?;
    template
        .render(context! {
            case_id => case_id,
            buggy_code => buggy_code.trim_end(),
            error_log => error_log.trim_end(),
        })
        .context("render repair opening prompt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::case::sample_case;
    use crate::core::types::RefactoringKind;

    #[test]
    fn developer_prompt_carries_the_field_delimiter() {
        let prompt = system_prompt(Role::Developer).expect("render");
        assert!(prompt.contains(BLOCK_DELIMITER));
        assert!(prompt.contains("No need to refactor."));
    }

    #[test]
    fn opening_names_case_kind_and_method() {
        let case = sample_case(RefactoringKind::MoveMethod);
        let prompt = opening_prompt(&case).expect("render");
        assert!(prompt.contains("commons-lang-42"));
        assert!(prompt.contains("Move Method"));
        assert!(prompt.contains("public int area()"));
    }

    #[test]
    fn repair_opening_carries_code_and_log() {
        let prompt =
            repair_opening_prompt("case-1", "class Broken {", "error: eof").expect("render");
        assert!(prompt.contains("class Broken {"));
        assert!(prompt.contains("error: eof"));
    }
}
