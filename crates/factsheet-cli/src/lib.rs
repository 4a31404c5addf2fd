//! Factsheet CLI library.
//!
//! Argument parsing, configuration loading, command execution and output
//! formatting for the `factsheet` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, CliFormat, Command};
pub use error::{CliError, Result};
pub use output::Formatter;
