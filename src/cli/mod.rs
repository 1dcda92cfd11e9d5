//! CLI layer for tandem.
//!
//! Provides the command-line interface using clap, with commands for
//! running the pipeline, checking keys, and managing prompt templates.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, KeyArgs};
