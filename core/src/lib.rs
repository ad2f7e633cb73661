//! Single-exchange HTTP helper with an exactly-once completion callback.
//!
//! # Overview
//! [`HttpClient`] issues one HTTP exchange per call (GET, POST, JSON, form,
//! or any method through [`HttpClient::request`]) over a pluggable
//! [`Transport`] and reports the result through a callback that is invoked
//! exactly once, with a [`Response`] of the same shape on every path:
//! success, transport error, timeout or abort.
//!
//! # Design
//! - `HttpClient` is stateless; it holds only a [`TransportFactory`] and a
//!   [`ClientConfig`]. Each call builds its own transport and
//!   [`ExchangeHandler`], so no state is shared between exchanges.
//! - The transport does the I/O and reports events; the core decides what
//!   they mean. A `Done` ready state with status 0 is never a completion.
//! - Malformed header options degrade to "no custom headers"; nothing
//!   throws past the client. Every failure reaches the caller through the
//!   callback.
//! - The form and JSON encoders return new options carrying `Content-Type`
//!   rather than editing the caller's.

pub mod client;
pub mod config;
pub mod encode;
pub mod error;
pub mod exchange;
pub mod headers;
pub mod http;
pub mod transport;
pub mod types;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use encode::{encode_form, encode_json, EncodedBody, FormValue};
pub use error::{EncodeError, TransportError, UnknownResponseType};
pub use exchange::{ExchangeHandler, ExchangeState};
pub use headers::{apply_request_headers, parse_response_headers};
pub use http::{HttpMethod, ReadyState, RequestBody, TransportEvent, TransportState};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::{ScriptedFactory, ScriptedHandle, ScriptedTransport, Transport, TransportFactory};
pub use types::{Outcome, RequestOptions, Response, ResponseBody, ResponseType, DEFAULT_TIMEOUT};
