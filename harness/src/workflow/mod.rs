pub mod engine;
pub mod messages;
pub mod prompts;
pub mod repair;
pub mod retrieval;
pub mod router;
pub mod tools;
