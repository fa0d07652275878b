//! Pure verification logic: parsing, validation, reconstruction.
//!
//! Nothing in this module performs I/O or spawns processes; everything is
//! deterministic given its inputs, which keeps the whole answer-handling
//! pipeline unit-testable without a Java project on disk.

pub mod blocks;
pub mod case;
pub mod fields;
pub mod imports;
pub mod java;
pub mod reconstruct;
pub mod session;
pub mod types;
