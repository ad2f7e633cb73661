//! Transport-facing plain data for the host-does-IO pattern.
//!
//! # Design
//! These types describe what crosses the transport seam: the method and body
//! handed to a transport, and the snapshot a transport exposes whenever it
//! signals an event. The core never touches the network itself; a
//! [`Transport`](crate::transport::Transport) implementation performs the
//! actual exchange and reports back through these values.
//!
//! All fields use owned types (`String`, `Vec`) so a snapshot can be moved to
//! whichever thread delivers the event.

use std::fmt;

/// HTTP method for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw request payload. Absent bodies are `None` at the call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Bytes(Vec<u8>),
}

impl RequestBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RequestBody::Text(text) => text.as_bytes(),
            RequestBody::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RequestBody::Text(text) => text.into_bytes(),
            RequestBody::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<&[u8]> for RequestBody {
    fn from(bytes: &[u8]) -> Self {
        RequestBody::Bytes(bytes.to_vec())
    }
}

/// Progress of the underlying transport, in the order a transport walks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    Unsent,
    Opened,
    HeadersReceived,
    Loading,
    Done,
}

/// What a transport knows about its exchange at the moment it signals an
/// event.
///
/// `raw_headers` is the unparsed response header block (`Name: Value` lines);
/// `body` is the raw payload, interpreted later according to the declared
/// [`ResponseType`](crate::types::ResponseType).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportState {
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub response_url: String,
    pub raw_headers: String,
    pub body: Vec<u8>,
}

/// A notification a transport delivers to the armed handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// `TransportState::ready_state` moved; only `Done` with a non-zero status
    /// completes the exchange.
    ReadyStateChange,
    Error,
    Timeout,
    Abort,
}
