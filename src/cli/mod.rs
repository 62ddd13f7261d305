//! CLI-specific functionality for multi-session
//!
//! This module contains all CLI-related code including argument parsing,
//! configuration discovery, session file persistence and command execution.

pub mod args;
pub mod commands;
pub mod config;
pub mod persist;

pub use args::{Args, Commands};
pub use commands::SessionCli;
pub use config::{CliConfig, ConfigDiscovery};
pub use persist::SessionFile;
