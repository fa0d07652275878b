//! Stable exit codes for harness CLI commands.

/// Command succeeded; for `verify`/`run`, both verdicts hold.
pub const OK: i32 = 0;
/// Command failed due to invalid config, dataset, or other errors.
pub const INVALID: i32 = 1;
/// `verify` or `run` finished without both verdicts holding.
pub const UNVERIFIED: i32 = 2;
