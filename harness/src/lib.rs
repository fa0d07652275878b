//! Verification harness for LLM-proposed Java refactorings.
//!
//! A Developer agent proposes a refactoring, a Reviewer agent checks it with
//! tools, and the loop converges when an external detection oracle and a
//! compile check both accept the proposal. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure logic (answer parsing, field extraction, import
//!   resolution, file reconstruction). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (datasets, git, gradle, the oracle
//!   process, style checking). Isolated behind traits to enable scripted
//!   fakes in tests.
//!
//! [`verify`] dispatches parsed answers to the oracle and the build;
//! [`workflow`] runs the cooperative agent loop on top of it.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
pub mod workflow;
