//! Environment constants and path utilities for multi-session.
//!
//! This module centralizes the default names, lengths and file locations used
//! throughout the crate and the `msess` binary.

/// Main application directory name (hidden directory like .git, .vscode)
pub const MSESS_DIR_NAME: &str = ".msess";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Local configuration file name looked up in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "msess.toml";

/// Session-related defaults
pub mod session {
    /// Top-level property of the session container the store is nested under
    pub const DEFAULT_KEY: &str = "multisession";

    /// Length of generated handles
    pub const DEFAULT_HANDLE_LENGTH: usize = 4;

    /// How many times a colliding handle is regenerated before giving up
    pub const MAX_HANDLE_ATTEMPTS: u32 = 16;

    /// Field compared by the default identity policy
    pub const DEFAULT_ID_FIELD: &str = "id";

    /// Login kind (`type`) recorded for federated logins
    pub const FEDERATED_KIND: &str = "federated";

    /// Session state file name used by the CLI
    pub const SESSION_FILE_NAME: &str = "session.json";
}

/// Test-related constants
pub mod test {
    /// Handle used by fixtures that seed a store directly
    pub const TEST_HANDLE: &str = "a001";
}

use std::path::{Path, PathBuf};

/// Build the main .msess directory path from a root directory
pub fn msess_dir_path(root: &Path) -> PathBuf {
    root.join(MSESS_DIR_NAME)
}

/// Build the local config file path (.msess/config.toml) from a directory
pub fn local_config_file_path(dir: &Path) -> PathBuf {
    msess_dir_path(dir).join(CONFIG_FILE_NAME)
}

/// Build the user config directory path (~/.msess)
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    msess_dir_path(home_dir)
}

/// Build the user config file path (~/.msess/config.toml)
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build the default session file path (.msess/session.json)
pub fn default_session_file_path(dir: &Path) -> PathBuf {
    msess_dir_path(dir).join(session::SESSION_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builders() {
        let root = Path::new("/home/jane");
        assert_eq!(msess_dir_path(root), PathBuf::from("/home/jane/.msess"));
        assert_eq!(
            user_config_file_path(root),
            PathBuf::from("/home/jane/.msess/config.toml")
        );
        assert_eq!(
            default_session_file_path(root),
            PathBuf::from("/home/jane/.msess/session.json")
        );
    }
}
