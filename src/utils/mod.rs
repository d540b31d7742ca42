//! Shared utilities.

pub mod process;

pub use process::{check_binary, command_stdout, ToolFailure};
