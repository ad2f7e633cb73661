//! Native transport backed by `ureq` 3.
//!
//! # Design
//! `ureq` is blocking, so `send` moves the whole exchange onto a named worker
//! thread and returns at once. Events are reported from that thread in the
//! order a browser would report them: a ready-state change per phase on
//! success, and on failure a zero-status `Done` followed by `Timeout` or
//! `Error`. Non-2xx statuses are ordinary completions, not errors.

use std::thread;
use std::time::Duration;

use ureq::http::{self, HeaderMap};
use ureq::{Agent, ResponseExt};

use super::{validate_header, Transport};
use crate::error::TransportError;
use crate::exchange::ExchangeHandler;
use crate::http::{HttpMethod, ReadyState, RequestBody, TransportEvent, TransportState};
use crate::types::{ResponseType, DEFAULT_TIMEOUT};

const WORKER_THREAD_NAME: &str = "xhr-exchange";

/// Performs one exchange over HTTP(S) with `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    target: Option<(HttpMethod, String)>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    response_type: ResponseType,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            target: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            response_type: ResponseType::default(),
        }
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn agent(&self) -> Agent {
        let timeout = (!self.timeout.is_zero()).then_some(self.timeout);
        Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent()
    }

    fn execute(self, body: Option<RequestBody>, mut handler: ExchangeHandler) {
        let mut state = TransportState {
            ready_state: ReadyState::Opened,
            ..TransportState::default()
        };
        let Some((method, url)) = self.target.clone() else {
            log::warn!("exchange {}: sent before open", handler.id());
            handler.handle(TransportEvent::Error, &state);
            return;
        };

        let mut builder = http::Request::builder().method(method.as_str()).uri(url.as_str());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let agent = self.agent();
        log::debug!(
            "exchange {}: {method} {url} (timeout {:?}, response type {:?})",
            handler.id(),
            self.timeout,
            self.response_type.as_str()
        );

        let result = match body {
            Some(body) => builder
                .body(body.into_bytes())
                .map_err(request_error)
                .and_then(|request| agent.run(request)),
            None => builder
                .body(())
                .map_err(request_error)
                .and_then(|request| agent.run(request)),
        };

        let mut response = match result {
            Ok(response) => response,
            Err(err) => return report_failure(&mut handler, &mut state, &err),
        };

        state.status = response.status().as_u16();
        state.status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        state.response_url = response.get_uri().to_string();
        state.raw_headers = header_block(response.headers());
        state.ready_state = ReadyState::HeadersReceived;
        handler.handle(TransportEvent::ReadyStateChange, &state);

        state.ready_state = ReadyState::Loading;
        handler.handle(TransportEvent::ReadyStateChange, &state);

        // No size cap: a browser transport reads whatever the server sends.
        match response.body_mut().with_config().limit(u64::MAX).read_to_vec() {
            Ok(bytes) => {
                state.body = bytes;
                state.ready_state = ReadyState::Done;
                handler.handle(TransportEvent::ReadyStateChange, &state);
            }
            Err(err) => report_failure(&mut handler, &mut state, &err),
        }
    }
}

impl Transport for UreqTransport {
    fn open(&mut self, method: HttpMethod, url: &str) -> Result<(), TransportError> {
        let parsed =
            url::Url::parse(url).map_err(|_| TransportError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }
        self.target = Some((method, url.to_string()));
        self.headers.clear();
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        if self.target.is_none() {
            return Err(TransportError::NotOpened);
        }
        validate_header(name, value)?;
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn set_response_type(&mut self, response_type: ResponseType) {
        self.response_type = response_type;
    }

    fn send(self, body: Option<RequestBody>, handler: ExchangeHandler) {
        let id = handler.id();
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.execute(body, handler));
        // A failed spawn drops the handler, which completes the exchange as
        // aborted.
        if let Err(err) = spawned {
            log::error!("exchange {id}: could not start worker thread: {err}");
        }
    }
}

fn request_error(err: http::Error) -> ureq::Error {
    ureq::Error::Http(err)
}

fn report_failure(handler: &mut ExchangeHandler, state: &mut TransportState, err: &ureq::Error) {
    let event = match err {
        ureq::Error::Timeout(_) => TransportEvent::Timeout,
        _ => TransportEvent::Error,
    };
    log::debug!("exchange {}: transport failure: {err}", handler.id());

    state.ready_state = ReadyState::Done;
    state.status = 0;
    state.status_text.clear();
    handler.handle(TransportEvent::ReadyStateChange, state);
    handler.handle(event, state);
}

/// Render response headers as the raw `Name: Value` block the header codec
/// parses. Value bytes are read as Latin-1, so nothing is dropped.
fn header_block(headers: &HeaderMap) -> String {
    let mut block = String::new();
    for (name, value) in headers {
        block.push_str(name.as_str());
        block.push_str(": ");
        block.extend(value.as_bytes().iter().map(|&b| char::from(b)));
        block.push_str("\r\n");
    }
    block
}
