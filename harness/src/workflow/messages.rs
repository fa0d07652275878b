//! Conversation transcript.
//!
//! The transcript is append-only: messages are pushed as they happen and
//! never rewritten, so a partial transcript from a failed run is still a
//! faithful record of what was said.

use serde::{Deserialize, Serialize};

use crate::workflow::tools::ToolCall;

/// Agent roles in the cooperative loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Proposes refactored code.
    Developer,
    /// Checks proposals with tools and relays the results.
    Reviewer,
    /// Fixes code that passed the oracle but failed to compile.
    Repairer,
}

impl Role {
    /// Who speaks after this role hands the conversation on.
    pub fn counterpart(self) -> Role {
        match self {
            Role::Developer | Role::Repairer => Role::Reviewer,
            Role::Reviewer => Role::Developer,
        }
    }
}

/// Who produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sender {
    /// The opening prompt injected by the harness.
    User,
    Agent { role: Role },
    Tool { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            tool_call: None,
        }
    }

    pub fn agent(role: Role, content: impl Into<String>, tool_call: Option<ToolCall>) -> Self {
        Self {
            sender: Sender::Agent { role },
            content: content.into(),
            tool_call,
        }
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Tool { name: name.into() },
            content: content.into(),
            tool_call: None,
        }
    }
}

/// Render a transcript as sender-tagged text, the form stored on dataset
/// records.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        let tag = match &message.sender {
            Sender::User => "user".to_string(),
            Sender::Agent { role } => match role {
                Role::Developer => "developer".to_string(),
                Role::Reviewer => "reviewer".to_string(),
                Role::Repairer => "repairer".to_string(),
            },
            Sender::Tool { name } => format!("tool:{name}"),
        };
        out.push_str(&format!("[{tag}]\n{}\n\n", message.content));
    }
    out.trim_end().to_string()
}
