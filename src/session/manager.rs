use crate::env;
use crate::session::collaborator::Serializer;
use crate::session::context::SessionContext;
use crate::session::handle::{HandleGenerator, RandomHandles};
use crate::session::policy::{IdFieldPolicy, IdentityPolicy};
use crate::session::store::{LoginInfo, MethodEvent, SessionMap, SessionRecord, SessionStore};
use crate::session::types::{Handle, SessionConfig, SessionError};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Records logins into the session store and removes them on logout
pub struct SessionManager<C, U> {
    config: SessionConfig,
    serializer: Serializer<C, U>,
    handles: Arc<dyn HandleGenerator>,
    policy: Arc<dyn IdentityPolicy>,
}

/// One recorded identity, as listed by [`SessionManager::accounts`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub handle: Handle,
    pub user: Value,
    pub methods: Vec<MethodEvent>,
    pub is_default: bool,
}

impl<C, U> SessionManager<C, U>
where
    C: SessionContext,
{
    /// Create a new session manager
    pub fn new(config: SessionConfig, serializer: Serializer<C, U>) -> Self {
        let handles = Arc::new(RandomHandles::new(config.handle_length));
        let policy = Arc::new(IdFieldPolicy::new(config.id_field.clone()));
        Self {
            config,
            serializer,
            handles,
            policy,
        }
    }

    /// Replace the handle generator
    pub fn with_handle_generator(mut self, generator: impl HandleGenerator + 'static) -> Self {
        self.handles = Arc::new(generator);
        self
    }

    /// Replace the identity equality policy
    pub fn with_policy(mut self, policy: impl IdentityPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Record a successful authentication of `user`
    ///
    /// Returns the handle of the record the login landed in. A user already
    /// present in the session keeps its handle; a new user gets a fresh one and
    /// becomes the default only if it is the first identity in the session.
    pub async fn log_in(
        &self,
        ctx: &mut C,
        user: &U,
        login: &LoginInfo,
    ) -> Result<Handle, SessionError> {
        let serialized = self
            .serializer
            .serialize(ctx, user)
            .await
            .map_err(|e| {
                warn!("Serializing user for login failed: {}", e);
                SessionError::Serialization(e)
            })?;

        let key = self.config.key.as_str();
        let container = ctx.session_mut().ok_or(SessionError::SessionUnavailable)?;

        // Work on a decoded copy; the container only changes once everything succeeded
        let mut store = container.load_store(key)?.unwrap_or_default();
        let event = MethodEvent::from_info(login, Utc::now());
        let handle = self.record_login(&mut store, serialized, event)?;
        container.save_store(key, &store)?;

        Ok(handle)
    }

    fn record_login(
        &self,
        store: &mut SessionStore,
        user: Value,
        event: MethodEvent,
    ) -> Result<Handle, SessionError> {
        let sessions = store.sessions.get_or_insert_with(SessionMap::new);

        if let Some((handle, record)) = sessions
            .iter_mut()
            .find(|(_, record)| self.policy.equals_user(&record.user, &user))
        {
            record.user = user;
            let methods = record.methods.get_or_insert_with(Vec::new);
            match methods
                .iter_mut()
                .find(|existing| self.policy.equals_method(existing, &event))
            {
                Some(existing) => {
                    debug!(
                        "Refreshing {:?} login for session {}",
                        event.discriminator(),
                        handle
                    );
                    *existing = event;
                }
                None => {
                    debug!(
                        "Adding {:?} login to session {}",
                        event.discriminator(),
                        handle
                    );
                    methods.push(event);
                }
            }
            info!("Merged login into existing session {}", handle);
            return Ok(handle.clone());
        }

        let first = sessions.is_empty();
        let handle = self.allocate_handle(sessions)?;
        sessions.insert(handle.clone(), SessionRecord::new(user, event));

        if first {
            store.default = Some(handle.clone());
            info!("Created session {} as default", handle);
        } else {
            info!("Created session {}", handle);
        }

        Ok(handle)
    }

    fn allocate_handle(&self, sessions: &SessionMap) -> Result<Handle, SessionError> {
        for _ in 0..env::session::MAX_HANDLE_ATTEMPTS {
            let handle = self.handles.generate();
            if !sessions.contains(&handle) {
                return Ok(handle);
            }
            debug!("Generated handle {} already in use, retrying", handle);
        }

        warn!(
            "Handle generator kept colliding after {} attempts",
            env::session::MAX_HANDLE_ATTEMPTS
        );
        Err(SessionError::HandleExhausted(
            env::session::MAX_HANDLE_ATTEMPTS,
        ))
    }

    /// Remove one identity (`selector`) or all of them (`None`)
    ///
    /// Returns how many records were removed; nothing to remove is not an
    /// error. Records are dropped from the stored JSON directly, so a store
    /// holding events this crate cannot decode can still be logged out of.
    pub fn log_out(&self, ctx: &mut C, selector: Option<&str>) -> Result<usize, SessionError> {
        let Some(container) = ctx.session_mut() else {
            debug!("Logout without session support, nothing to do");
            return Ok(0);
        };
        let Some(Value::Object(store)) = container.get_mut(&self.config.key) else {
            debug!("No session store, nothing to log out");
            return Ok(0);
        };

        let removed = match selector {
            Some(handle) => {
                let Some(Value::Object(sessions)) = store.get_mut("sessions") else {
                    return Ok(0);
                };
                if sessions.shift_remove(handle).is_none() {
                    debug!("Logout of unknown session {}, nothing to do", handle);
                    return Ok(0);
                }
                let emptied = sessions.is_empty();

                if store.get("default").and_then(Value::as_str) == Some(handle) {
                    store.shift_remove("default");
                }
                if emptied {
                    store.shift_remove("sessions");
                }
                info!("Logged out session {}", handle);
                1
            }
            None => {
                let count = match store.shift_remove("sessions") {
                    Some(Value::Object(sessions)) => sessions.len(),
                    _ => 0,
                };
                store.shift_remove("default");
                info!("Logged out all {} sessions", count);
                count
            }
        };

        Ok(removed)
    }

    /// Make `handle` the identity restored when no selector is given
    pub fn set_default(&self, ctx: &mut C, handle: &str) -> Result<(), SessionError> {
        let key = self.config.key.as_str();
        let container = ctx.session_mut().ok_or(SessionError::SessionUnavailable)?;
        let mut store = container.load_store(key)?.unwrap_or_default();

        if store.record(handle).is_none() {
            return Err(SessionError::UnknownSelector(handle.to_string()));
        }

        store.default = Some(handle.to_string());
        info!("Default session switched to {}", handle);
        container.save_store(key, &store)
    }

    /// Every recorded identity, in session order
    pub fn accounts(&self, ctx: &C) -> Result<Vec<Account>, SessionError> {
        let container = ctx.session().ok_or(SessionError::SessionUnavailable)?;
        let Some(store) = container.load_store(&self.config.key)? else {
            return Ok(Vec::new());
        };
        let Some(sessions) = store.sessions.as_ref() else {
            return Ok(Vec::new());
        };

        Ok(sessions
            .iter()
            .map(|(handle, record)| Account {
                handle: handle.clone(),
                user: record.user.clone(),
                methods: record.events().to_vec(),
                is_default: store.default.as_ref() == Some(handle),
            })
            .collect())
    }
}
