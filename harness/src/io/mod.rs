//! Side-effect surface: external processes, the filesystem, git.

pub mod artifacts;
pub mod build;
pub mod config;
pub mod dataset;
pub mod git;
pub mod oracle;
pub mod process;
pub mod siblings;
pub mod style;
pub mod toolchain;
