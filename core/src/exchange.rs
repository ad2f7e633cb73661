//! Per-exchange terminal-event handling.
//!
//! # Design
//! An [`ExchangeHandler`] is the set of armed handlers for one exchange. The
//! controller creates it, hands it to the transport in
//! [`Transport::send`](crate::transport::Transport::send), and from then on the
//! transport reports every event through [`ExchangeHandler::handle`].
//!
//! The completion callback sits in a one-shot slot. Whichever terminal event
//! arrives first takes it; every later event finds the slot empty and is
//! dropped. Because `handle` needs `&mut self`, two events can never race on
//! the same handler. A handler dropped while the slot is still full completes
//! as aborted, so a transport that loses an exchange cannot leave the caller
//! waiting forever.

use std::fmt;

use uuid::Uuid;

use crate::headers::parse_response_headers;
use crate::http::{ReadyState, TransportEvent, TransportState};
use crate::types::{Outcome, Response, ResponseBody, ResponseType};

pub const REQUEST_ERROR: &str = "Request error";
pub const REQUEST_TIMEOUT: &str = "Request timeout";
pub const REQUEST_ABORTED: &str = "Request aborted";
pub const BODY_NOT_ENCODED: &str = "Request body could not be encoded";

/// Completion callback, invoked exactly once per exchange.
pub type Callback = Box<dyn FnOnce(Response) + Send + 'static>;

/// Lifecycle of a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Created,
    Sent,
    Done(Outcome),
}

/// Armed terminal-event handlers of one exchange.
pub struct ExchangeHandler {
    id: Uuid,
    url: String,
    response_type: ResponseType,
    state: ExchangeState,
    callback: Option<Callback>,
}

impl ExchangeHandler {
    pub(crate) fn new(url: &str, response_type: ResponseType, callback: Callback) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.to_string(),
            response_type,
            state: ExchangeState::Created,
            callback: Some(callback),
        }
    }

    /// Identifier used to correlate log lines of one exchange.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.callback.is_none()
    }

    pub(crate) fn mark_sent(&mut self) {
        if self.state == ExchangeState::Created {
            self.state = ExchangeState::Sent;
        }
    }

    /// Report a transport event. `state` is the transport's view at the time
    /// of the event.
    pub fn handle(&mut self, event: TransportEvent, state: &TransportState) {
        if self.is_completed() {
            log::trace!("exchange {}: {event:?} after completion dropped", self.id);
            return;
        }

        match event {
            TransportEvent::ReadyStateChange => {
                if state.ready_state != ReadyState::Done {
                    return;
                }
                if state.status == 0 {
                    log::debug!("exchange {}: zero-status completion ignored", self.id);
                    return;
                }
                let response = self.success(state);
                self.complete(response);
            }
            TransportEvent::Error => self.fail(Outcome::Error, REQUEST_ERROR, state.status),
            TransportEvent::Timeout => self.fail(Outcome::Timeout, REQUEST_TIMEOUT, state.status),
            TransportEvent::Abort => self.fail(Outcome::Aborted, REQUEST_ABORTED, state.status),
        }
    }

    /// Complete with a failure-shaped response unless already completed.
    pub(crate) fn fail(&mut self, outcome: Outcome, message: &str, status: u16) {
        if self.is_completed() {
            return;
        }
        let response = Response::failure(outcome, message, self.response_type, &self.url, status);
        self.complete(response);
    }

    fn success(&self, state: &TransportState) -> Response {
        let final_url = if state.response_url.is_empty() {
            self.url.clone()
        } else {
            state.response_url.clone()
        };
        Response {
            outcome: Outcome::Success,
            body: ResponseBody::decode(self.response_type, state.body.clone()),
            response_type: self.response_type,
            final_url,
            status: state.status,
            status_text: state.status_text.clone(),
            headers: parse_response_headers(&state.raw_headers),
        }
    }

    fn complete(&mut self, response: Response) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        self.state = ExchangeState::Done(response.outcome);
        log::debug!(
            "exchange {}: {:?} with status {} ({})",
            self.id,
            response.outcome,
            response.status,
            response.status_text
        );
        callback(response);
    }
}

impl Drop for ExchangeHandler {
    fn drop(&mut self) {
        if !self.is_completed() {
            log::warn!("exchange {}: transport dropped the exchange without a terminal event", self.id);
            self.fail(Outcome::Aborted, REQUEST_ABORTED, 0);
        }
    }
}

impl fmt::Debug for ExchangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeHandler")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("response_type", &self.response_type)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
