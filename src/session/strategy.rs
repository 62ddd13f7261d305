use crate::session::collaborator::Deserializer;
use crate::session::context::SessionContext;
use crate::session::store::{SessionRecord, SessionStore};
use crate::session::stream::PauseGuard;
use crate::session::types::{AuthInfo, AuthenticateOptions, Restored, SessionConfig, SessionError};
use tracing::{debug, info, warn};

/// Restores the identities recorded in a request's session
pub struct SessionStrategy<C, U> {
    config: SessionConfig,
    deserializer: Deserializer<C, U>,
}

impl<C, U> SessionStrategy<C, U>
where
    C: SessionContext,
{
    pub const NAME: &'static str = "session";

    pub fn new(config: SessionConfig, deserializer: Deserializer<C, U>) -> Self {
        Self {
            config,
            deserializer,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Authenticate a request from its session state
    ///
    /// An explicit selector on the request wins over the stored default. In
    /// multi mode without a selector every identity is restored, in session
    /// order, one deserialization at a time.
    pub async fn authenticate(
        &self,
        ctx: &mut C,
        options: &AuthenticateOptions,
    ) -> Result<Restored<U>, SessionError> {
        let container = ctx.session().ok_or(SessionError::SessionUnavailable)?;
        let store = match container.load_store(&self.config.key)? {
            Some(store) if store.has_sessions() => store,
            _ => {
                debug!("No login sessions to restore");
                return Ok(Restored::Anonymous);
            }
        };

        let selector = ctx.session_selector();
        if selector.is_none() && options.multi {
            return self.restore_all(ctx, &store, options).await;
        }

        let Some(handle) = selector.or_else(|| store.default.clone()) else {
            debug!("No session selected and no default session");
            return Ok(Restored::Anonymous);
        };
        let Some(record) = store.record(&handle) else {
            debug!("Selected session {} does not exist", handle);
            return Ok(Restored::Anonymous);
        };
        if record.user.is_null() {
            return Ok(Restored::Anonymous);
        }

        let guard = pause_if_requested(ctx, options);
        let outcome = match self.deserializer.deserialize(ctx, record.user.clone()).await {
            Ok(Some(user)) => {
                debug!("Restored session {}", handle);
                Ok(Restored::Single {
                    info: auth_info(&handle, record),
                    user,
                })
            }
            Ok(None) => {
                info!("Session {} no longer resolves to a user", handle);
                ctx.forget_identity(&handle);
                Ok(Restored::Anonymous)
            }
            Err(source) => {
                warn!("Deserializing session {} failed: {}", handle, source);
                Err(SessionError::Deserialization { handle, source })
            }
        };
        guard.resume();

        outcome
    }

    async fn restore_all(
        &self,
        ctx: &mut C,
        store: &SessionStore,
        options: &AuthenticateOptions,
    ) -> Result<Restored<U>, SessionError> {
        let Some(sessions) = store.sessions.as_ref() else {
            return Ok(Restored::Anonymous);
        };

        let guard = pause_if_requested(ctx, options);
        let mut users = Vec::with_capacity(sessions.len());
        let mut infos = Vec::with_capacity(sessions.len());

        for (handle, record) in sessions.iter() {
            if record.user.is_null() {
                continue;
            }
            match self.deserializer.deserialize(ctx, record.user.clone()).await {
                Ok(Some(user)) => {
                    users.push(user);
                    infos.push(auth_info(handle, record));
                }
                Ok(None) => {
                    info!("Session {} no longer resolves to a user, skipping", handle);
                    ctx.forget_identity(handle);
                }
                Err(source) => {
                    warn!("Deserializing session {} failed: {}", handle, source);
                    guard.resume();
                    return Err(SessionError::Deserialization {
                        handle: handle.clone(),
                        source,
                    });
                }
            }
        }
        guard.resume();

        debug!("Restored {} of {} sessions", users.len(), sessions.len());
        if users.len() > 1 {
            return Ok(Restored::Multiple { users, infos });
        }
        Ok(match (users.pop(), infos.pop()) {
            (Some(user), Some(info)) => Restored::Single { user, info },
            _ => Restored::Anonymous,
        })
    }
}

fn pause_if_requested<C: SessionContext>(ctx: &mut C, options: &AuthenticateOptions) -> PauseGuard {
    if options.pause_stream {
        PauseGuard::new(ctx.pause_events())
    } else {
        PauseGuard::new(None)
    }
}

fn auth_info(handle: &str, record: &SessionRecord) -> AuthInfo {
    AuthInfo {
        session_selector: handle.to_string(),
        methods: record.methods.clone(),
    }
}
