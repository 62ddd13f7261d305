//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `login`: Record a login for an account in the session file
//! - `logout`: Remove one account, or all of them
//! - `restore`: Show which account(s) a request would restore
//! - `switch`: Change the default account
//! - `list`: List the accounts recorded in the session file
//! - `show-config`: Show configuration discovery information
//! - `init-config`: Create a default user configuration file

use crate::session::LoginInfo;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_METHOD: &str = "password";
const DEFAULT_PROTOCOL: &str = "openidconnect";

#[derive(Debug, Parser)]
#[command(name = "msess")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and drive a multi-account login session stored in a JSON file")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Session file path
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Record a login for an account
    Login {
        /// Account identifier
        id: String,
        /// Display name stored with the account
        #[arg(long = "name")]
        name: Option<String>,
        /// How the account authenticated (password, otp, ...); defaults to password
        #[arg(short = 'm', long = "method")]
        method: Option<String>,
        /// Record a federated login from this provider
        #[arg(long = "provider")]
        provider: Option<String>,
        /// Federation protocol used with --provider; defaults to openidconnect
        #[arg(long = "protocol")]
        protocol: Option<String>,
    },
    /// Remove one account, or every account when no handle is given
    Logout {
        /// Handle of the account to remove
        #[arg(short = 's', long = "select")]
        select: Option<String>,
    },
    /// Show the account(s) a request would restore
    Restore {
        /// Restore this handle instead of the default
        #[arg(short = 's', long = "select")]
        select: Option<String>,
        /// Restore every account
        #[arg(long = "multi")]
        multi: bool,
    },
    /// Make an account the default
    Switch {
        /// Handle of the account
        handle: String,
    },
    /// List recorded accounts
    List,
    /// Show configuration discovery information
    ShowConfig,
    /// Create a default configuration file in ~/.msess
    InitConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

impl Commands {
    /// Login details for a `login` command
    pub fn login_info(&self) -> Option<LoginInfo> {
        match self {
            Commands::Login {
                method,
                provider: Some(provider),
                protocol,
                ..
            } => {
                let protocol = protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL);
                let mut info = LoginInfo::federated(provider.clone(), protocol);
                info.method = method.clone();
                Some(info)
            }
            Commands::Login { method, .. } => Some(LoginInfo::method(
                method.as_deref().unwrap_or(DEFAULT_METHOD),
            )),
            _ => None,
        }
    }
}
