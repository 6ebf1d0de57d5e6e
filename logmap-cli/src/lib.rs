//! logmap CLI library -- argument parsing, command handlers and output rendering
//!
//! The `logmap` binary is a thin wrapper over this crate so that command
//! handlers can be exercised from integration tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
