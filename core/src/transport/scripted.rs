//! In-memory transport driven by hand.
//!
//! # Design
//! `ScriptedTransport` performs no I/O. It records how the controller
//! configured it and, once sent, parks the [`ExchangeHandler`] in state shared
//! with a [`ScriptedHandle`]. Whoever holds the handle sets the transport state
//! and fires events in any order, duplicates included, which is how the
//! exactly-once guarantee is exercised deterministically.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{validate_header, Transport, TransportFactory};
use crate::error::TransportError;
use crate::exchange::ExchangeHandler;
use crate::http::{HttpMethod, ReadyState, RequestBody, TransportEvent, TransportState};
use crate::types::ResponseType;

/// What the controller did to a scripted transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorded {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub response_type: Option<ResponseType>,
    pub body: Option<RequestBody>,
    pub sent: bool,
}

#[derive(Debug, Default)]
struct Shared {
    recorded: Recorded,
    state: TransportState,
    handler: Option<ExchangeHandler>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport half: handed to the controller.
#[derive(Debug)]
pub struct ScriptedTransport {
    shared: Arc<Mutex<Shared>>,
}

/// Test half: inspects the configuration and fires events.
#[derive(Debug, Clone)]
pub struct ScriptedHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedTransport {
    pub fn new() -> (Self, ScriptedHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let handle = ScriptedHandle {
            shared: Arc::clone(&shared),
        };
        (Self { shared }, handle)
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self, method: HttpMethod, url: &str) -> Result<(), TransportError> {
        url::Url::parse(url).map_err(|_| TransportError::InvalidUrl(url.to_string()))?;
        let mut shared = lock(&self.shared);
        shared.recorded.method = Some(method);
        shared.recorded.url = Some(url.to_string());
        shared.state.ready_state = ReadyState::Opened;
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let mut shared = lock(&self.shared);
        if shared.recorded.url.is_none() {
            return Err(TransportError::NotOpened);
        }
        validate_header(name, value)?;
        shared
            .recorded
            .headers
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        lock(&self.shared).recorded.timeout = Some(timeout);
    }

    fn set_response_type(&mut self, response_type: ResponseType) {
        lock(&self.shared).recorded.response_type = Some(response_type);
    }

    fn send(self, body: Option<RequestBody>, handler: ExchangeHandler) {
        let mut shared = lock(&self.shared);
        shared.recorded.body = body;
        shared.recorded.sent = true;
        shared.handler = Some(handler);
    }
}

impl ScriptedHandle {
    pub fn recorded(&self) -> Recorded {
        lock(&self.shared).recorded.clone()
    }

    pub fn is_sent(&self) -> bool {
        lock(&self.shared).recorded.sent
    }

    pub fn state(&self) -> TransportState {
        lock(&self.shared).state.clone()
    }

    pub fn update_state(&self, edit: impl FnOnce(&mut TransportState)) {
        edit(&mut lock(&self.shared).state);
    }

    /// Deliver `event` with the current state. Returns `false` when nothing
    /// has been sent yet.
    pub fn fire(&self, event: TransportEvent) -> bool {
        let (handler, state) = {
            let mut shared = lock(&self.shared);
            (shared.handler.take(), shared.state.clone())
        };
        let Some(mut handler) = handler else {
            return false;
        };
        // Dispatch without holding the lock so the callback may use the handle.
        handler.handle(event, &state);
        lock(&self.shared).handler = Some(handler);
        true
    }

    /// Walk the ready states of a successful exchange, firing a
    /// `ReadyStateChange` for each.
    pub fn respond(&self, status: u16, status_text: &str, raw_headers: &str, body: &[u8]) {
        self.update_state(|state| {
            state.status = status;
            state.status_text = status_text.to_string();
            state.raw_headers = raw_headers.to_string();
        });
        for ready_state in [ReadyState::HeadersReceived, ReadyState::Loading, ReadyState::Done] {
            self.update_state(|state| {
                state.ready_state = ready_state;
                if ready_state == ReadyState::Done {
                    state.body = body.to_vec();
                }
            });
            self.fire(TransportEvent::ReadyStateChange);
        }
    }

    /// Fail the way a browser does: a zero-status `Done` first, then the
    /// terminal event.
    pub fn fail(&self, event: TransportEvent) {
        self.update_state(|state| {
            state.ready_state = ReadyState::Done;
            state.status = 0;
            state.status_text.clear();
        });
        self.fire(TransportEvent::ReadyStateChange);
        self.fire(event);
    }

    /// Drop the parked exchange without any terminal event.
    pub fn lose_exchange(&self) {
        let handler = lock(&self.shared).handler.take();
        drop(handler);
    }

    pub fn is_completed(&self) -> bool {
        lock(&self.shared)
            .handler
            .as_ref()
            .is_some_and(ExchangeHandler::is_completed)
    }
}

/// Factory producing scripted transports and keeping their handles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    handles: Arc<Mutex<Vec<ScriptedHandle>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of every transport created so far, oldest first.
    pub fn handles(&self) -> Vec<ScriptedHandle> {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<ScriptedHandle> {
        self.handles().pop()
    }
}

impl TransportFactory for ScriptedFactory {
    type Transport = ScriptedTransport;

    fn create(&self) -> ScriptedTransport {
        let (transport, handle) = ScriptedTransport::new();
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
        transport
    }
}
