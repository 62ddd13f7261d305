use crate::env;
use crate::session::store::MethodEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opaque key identifying one identity's record within a session
pub type Handle = String;

/// Error type reported by serialize/deserialize collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Login sessions require session support: no session container on this request")]
    SessionUnavailable,
    #[error("Failed to serialize user into session: {0}")]
    Serialization(#[source] BoxError),
    #[error("Failed to deserialize user from session '{handle}': {source}")]
    Deserialization {
        handle: Handle,
        #[source]
        source: BoxError,
    },
    #[error("Session data under '{key}' is malformed: {source}")]
    MalformedStore {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No unused session handle after {0} attempts")]
    HandleExhausted(u32),
    #[error("Unknown session selector: {0}")]
    UnknownSelector(Handle),
}

/// Configuration shared by the session manager and the restoration strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Property of the session container the store is nested under
    pub key: String,
    /// Restore every recorded identity when no selector is given
    pub multi: bool,
    /// Hold request events while identities are being deserialized
    pub pause_stream: bool,
    /// Length of handles produced by the default generator
    pub handle_length: usize,
    /// Field compared by the default identity policy
    pub id_field: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: env::session::DEFAULT_KEY.to_string(),
            multi: false,
            pause_stream: false,
            handle_length: env::session::DEFAULT_HANDLE_LENGTH,
            id_field: env::session::DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to a TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Options for [`authenticate`](crate::session::SessionStrategy::authenticate) derived from this config
    pub fn authenticate_options(&self) -> AuthenticateOptions {
        AuthenticateOptions {
            multi: self.multi,
            pause_stream: self.pause_stream,
        }
    }
}

/// Per-call restoration options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthenticateOptions {
    pub multi: bool,
    pub pause_stream: bool,
}

impl AuthenticateOptions {
    pub fn multi() -> Self {
        Self {
            multi: true,
            ..Default::default()
        }
    }

    pub fn with_pause_stream(mut self) -> Self {
        self.pause_stream = true;
        self
    }
}

/// Authentication context reported alongside a restored identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    pub session_selector: Handle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<MethodEvent>>,
}

/// Outcome of a successful restoration
#[derive(Debug, Clone, PartialEq)]
pub enum Restored<U> {
    /// Nothing to restore; request state is left as it was
    Anonymous,
    Single {
        user: U,
        info: AuthInfo,
    },
    Multiple {
        users: Vec<U>,
        infos: Vec<AuthInfo>,
    },
}

impl<U> Restored<U> {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Restored::Anonymous)
    }

    /// Restored identities in order, regardless of shape
    pub fn users(&self) -> Vec<&U> {
        match self {
            Restored::Anonymous => Vec::new(),
            Restored::Single { user, .. } => vec![user],
            Restored::Multiple { users, .. } => users.iter().collect(),
        }
    }

    /// Auth info entries in the same order as [`users`](Self::users)
    pub fn infos(&self) -> Vec<&AuthInfo> {
        match self {
            Restored::Anonymous => Vec::new(),
            Restored::Single { info, .. } => vec![info],
            Restored::Multiple { infos, .. } => infos.iter().collect(),
        }
    }
}
