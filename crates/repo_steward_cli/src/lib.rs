//! Repo Steward CLI library exports.
//!
//! The binary is a thin shell over these modules so the command handlers can be
//! tested without spawning a process.

pub mod commands;
pub mod errors;
