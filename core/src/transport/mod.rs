//! The transport seam.
//!
//! This module defines the trait that decouples the exchange controller from
//! whatever actually moves bytes. A transport is configured step by step
//! (`open`, headers, timeout, response type), then consumes itself in `send`
//! and reports events to the [`ExchangeHandler`] it was given until one of
//! them completes the exchange.
//!
//! Two implementations ship with the crate: [`ScriptedTransport`], which lets
//! a test drive events by hand, and [`UreqTransport`] (feature `ureq`), which
//! performs the exchange over the network on a worker thread.

mod scripted;
#[cfg(feature = "ureq")]
mod ureq_3;

use std::time::Duration;

use crate::error::TransportError;
use crate::exchange::ExchangeHandler;
use crate::http::{HttpMethod, RequestBody};
use crate::types::ResponseType;

pub use scripted::{Recorded, ScriptedFactory, ScriptedHandle, ScriptedTransport};
#[cfg(feature = "ureq")]
pub use ureq_3::UreqTransport;

/// An asynchronous request/response primitive.
pub trait Transport: Send + 'static {
    /// Prepare an exchange. Fails when the URL cannot be used.
    fn open(&mut self, method: HttpMethod, url: &str) -> Result<(), TransportError>;

    /// Add one request header. Fails when the pair is not a valid header or
    /// the transport is not opened.
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// A zero duration disables the timeout.
    fn set_timeout(&mut self, timeout: Duration);

    fn set_response_type(&mut self, response_type: ResponseType);

    /// Start the exchange and return without waiting for it.
    ///
    /// The transport owns `handler` from here on and must report events to it
    /// with [`ExchangeHandler::handle`].
    fn send(self, body: Option<RequestBody>, handler: ExchangeHandler);
}

/// Creates one fresh transport per exchange.
pub trait TransportFactory {
    type Transport: Transport;

    fn create(&self) -> Self::Transport;
}

impl<F, T> TransportFactory for F
where
    F: Fn() -> T,
    T: Transport,
{
    type Transport = T;

    fn create(&self) -> T {
        self()
    }
}

/// Check a request header the way a browser does before accepting it: the
/// name must be an HTTP token and the value must not break the header line.
pub fn validate_header(name: &str, value: &str) -> Result<(), TransportError> {
    let invalid = |reason: &str| TransportError::InvalidHeader {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if !name.bytes().all(is_token_byte) {
        return Err(invalid("name is not an HTTP token"));
    }
    if value.bytes().any(|b| matches!(b, b'\r' | b'\n' | b'\0')) {
        return Err(invalid("value contains a line break or NUL"));
    }
    Ok(())
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_headers() {
        assert!(validate_header("X-Custom", "custom").is_ok());
        assert!(validate_header("content-type", "application/json;charset=UTF-8").is_ok());
        assert!(validate_header("X-Empty", "").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(matches!(
            validate_header("", "v"),
            Err(TransportError::InvalidHeader { .. })
        ));
        assert!(validate_header("Bad Name", "v").is_err());
        assert!(validate_header("X-A:", "v").is_err());
        assert!(validate_header("Ünicode", "v").is_err());
    }

    #[test]
    fn rejects_line_breaks_in_values() {
        assert!(validate_header("X-A", "a\r\nX-B: b").is_err());
        assert!(validate_header("X-A", "a\0").is_err());
    }

    #[test]
    fn closures_are_factories() {
        let factory = || ScriptedTransport::new().0;
        let _transport: ScriptedTransport = factory.create();
    }
}
