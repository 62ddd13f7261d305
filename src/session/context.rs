use crate::session::store::SessionContainer;
use crate::session::stream::{EventStream, StreamPause};
use crate::session::types::Handle;

/// What the session manager and strategy need from the request they run in
pub trait SessionContext {
    /// The session container, or `None` when the request has no session support
    fn session(&self) -> Option<&SessionContainer>;

    fn session_mut(&mut self) -> Option<&mut SessionContainer>;

    /// Caller-supplied handle selecting which identity to restore
    fn session_selector(&self) -> Option<String> {
        None
    }

    /// Pause the request's event source, if it has one
    fn pause_events(&mut self) -> Option<Box<dyn StreamPause>> {
        None
    }

    /// Called when a stored identity no longer deserializes to anything
    fn forget_identity(&mut self, _handle: &str) {}
}

/// In-process request context
#[derive(Debug, Default, Clone)]
pub struct RequestContext {
    pub session: Option<SessionContainer>,
    pub selector: Option<String>,
    pub stream: Option<EventStream>,
    /// Handles whose identity failed to resolve during this request
    pub forgotten: Vec<Handle>,
}

impl RequestContext {
    /// A request with an empty session container
    pub fn new() -> Self {
        Self::with_session(SessionContainer::new())
    }

    pub fn with_session(session: SessionContainer) -> Self {
        Self {
            session: Some(session),
            ..Default::default()
        }
    }

    /// A request without session support at all
    pub fn without_session() -> Self {
        Self::default()
    }

    pub fn select(mut self, handle: impl Into<String>) -> Self {
        self.selector = Some(handle.into());
        self
    }

    pub fn with_stream(mut self, stream: EventStream) -> Self {
        self.stream = Some(stream);
        self
    }
}

impl SessionContext for RequestContext {
    fn session(&self) -> Option<&SessionContainer> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Option<&mut SessionContainer> {
        self.session.as_mut()
    }

    fn session_selector(&self) -> Option<String> {
        self.selector.clone()
    }

    fn pause_events(&mut self) -> Option<Box<dyn StreamPause>> {
        self.stream
            .as_ref()
            .map(|stream| Box::new(stream.pause()) as Box<dyn StreamPause>)
    }

    fn forget_identity(&mut self, handle: &str) {
        self.forgotten.push(handle.to_string());
    }
}
