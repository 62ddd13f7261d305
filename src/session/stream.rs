use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Something the request source emits while the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    Data(Vec<u8>),
    End,
}

/// A paused event source; resuming consumes it
pub trait StreamPause: Send {
    fn resume(self: Box<Self>);
}

/// Request event source that can hold events back while identities load
///
/// Events emitted while paused are buffered and delivered in order on resume,
/// so listeners attached after authentication do not miss them.
#[derive(Clone)]
pub struct EventStream {
    state: Arc<Mutex<StreamState>>,
}

struct StreamState {
    paused: bool,
    buffer: VecDeque<RequestEvent>,
    sink: mpsc::UnboundedSender<RequestEvent>,
    pauses: u32,
    resumes: u32,
}

impl EventStream {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RequestEvent>) {
        let (sink, rx) = mpsc::unbounded_channel();
        let state = StreamState {
            paused: false,
            buffer: VecDeque::new(),
            sink,
            pauses: 0,
            resumes: 0,
        };
        (
            Self {
                state: Arc::new(Mutex::new(state)),
            },
            rx,
        )
    }

    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver an event, or hold it if the stream is paused
    pub fn emit(&self, event: RequestEvent) {
        let mut state = self.lock();
        if state.paused {
            state.buffer.push_back(event);
        } else {
            // A dropped receiver means nobody is listening any more
            let _ = state.sink.send(event);
        }
    }

    pub fn pause(&self) -> PausedStream {
        let mut state = self.lock();
        state.paused = true;
        state.pauses += 1;
        debug!("Request stream paused");
        PausedStream {
            stream: self.clone(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn buffered(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn pause_count(&self) -> u32 {
        self.lock().pauses
    }

    pub fn resume_count(&self) -> u32 {
        self.lock().resumes
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("EventStream")
            .field("paused", &state.paused)
            .field("buffered", &state.buffer.len())
            .finish()
    }
}

/// Token returned by [`EventStream::pause`]
#[derive(Debug)]
pub struct PausedStream {
    stream: EventStream,
}

impl StreamPause for PausedStream {
    fn resume(self: Box<Self>) {
        let mut state = self.stream.lock();
        state.paused = false;
        state.resumes += 1;
        let flushed = state.buffer.len();
        while let Some(event) = state.buffer.pop_front() {
            let _ = state.sink.send(event);
        }
        debug!("Request stream resumed, {} buffered events delivered", flushed);
    }
}

/// Resumes a paused source exactly once: explicitly, or when dropped
pub struct PauseGuard {
    paused: Option<Box<dyn StreamPause>>,
}

impl PauseGuard {
    pub fn new(paused: Option<Box<dyn StreamPause>>) -> Self {
        Self { paused }
    }

    pub fn is_holding(&self) -> bool {
        self.paused.is_some()
    }

    pub fn resume(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(paused) = self.paused.take() {
            paused.resume();
        }
    }
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.release();
    }
}
