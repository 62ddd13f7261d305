//! # Multi Session
//!
//! Keeps several authenticated identities in one client session and restores
//! one or all of them on later requests.
//!
//! ## Architecture Overview
//!
//! - **[`session`]**: the session store model, the login/logout manager and the
//!   restoration strategy, together with their pluggable collaborators
//! - **[`cli`]**: the `msess` command line tool operating on a JSON session file
//! - **[`env`]**: default names, lengths and file locations
//!
//! ## Features
//!
//! ### Write path
//! - **Merge on login**: a returning account keeps its handle; its method
//!   history is refreshed in place or extended
//! - **Default account**: the first identity in an empty session becomes the default
//! - **Selective logout**: remove one identity by handle, or all of them
//!
//! ### Read path
//! - **Selectors**: a caller-supplied handle overrides the default
//! - **Multi mode**: restore every identity in session order, sequentially
//! - **Stream pausing**: hold request events while identities are loaded
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multi_session::{
//!     AuthenticateOptions, Deserializer, LoginInfo, RequestContext, SessionConfig,
//!     SessionManager, SessionStrategy, Serializer,
//! };
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::default();
//!     let manager: SessionManager<RequestContext, Value> =
//!         SessionManager::new(config.clone(), Serializer::from_fn(|user: &Value| Ok(user.clone())));
//!     let strategy: SessionStrategy<RequestContext, Value> =
//!         SessionStrategy::new(config, Deserializer::from_fn(|value| Ok(Some(value))));
//!
//!     let mut ctx = RequestContext::new();
//!     let user = serde_json::json!({ "id": "248289761001", "displayName": "Jane Doe" });
//!     let handle = manager.log_in(&mut ctx, &user, &LoginInfo::method("password")).await?;
//!
//!     let restored = strategy.authenticate(&mut ctx, &AuthenticateOptions::default()).await?;
//!     println!("Restored {:?} from session {}", restored.users(), handle);
//!     Ok(())
//! }
//! ```

/// Multi-identity session state and the operations on it.
///
/// Provides the persisted store model, the session manager (login/logout),
/// the restoration strategy and the collaborator hooks they call.
pub mod session;

/// Default names, lengths and file locations.
pub mod env;

// Re-export main session types
pub use session::{
    Account, AuthInfo, AuthenticateOptions, Deserializer, EventStream, Handle, HandleGenerator,
    IdFieldPolicy, IdentityPolicy, LoginInfo, MethodEvent, RandomHandles, RequestContext,
    Restored, SessionConfig, SessionContainer, SessionContext, SessionError, SessionManager,
    SessionRecord, SessionStore, SessionStrategy, Serializer,
};

// CLI module for command-line interface
pub mod cli;
