//! Strongroom CLI - compile vault changes from backend JSON
//!
//! Reads requests, policies and whitelists from disk and prints call data,
//! diffs and the EIP-712 hashes devices sign.

pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use commands::{effective_config, run, Cli, Commands};
pub use config::{CliConfig, OutputFormat};
pub use error::{CliError, Result};
