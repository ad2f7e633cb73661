//! Caller-facing options and the normalized response.
//!
//! # Design
//! `RequestOptions` keeps its headers as a loosely typed JSON value because
//! options may arrive from untyped hosts (a JSON document, a scripting
//! bridge). The header codec is the one place that validates them, so a
//! malformed `headers` entry degrades to "no custom headers" instead of
//! failing the exchange. Typed callers use the `with_*` builders and never
//! see the loose representation.
//!
//! `Response` is the single shape every completion takes, success or not.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::UnknownResponseType;

/// Timeout applied when the options do not carry one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Header name the body encoders inject.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Expected interpretation of the response payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    /// Treated as text.
    #[default]
    #[serde(rename = "")]
    Empty,
    #[serde(rename = "arraybuffer")]
    ArrayBuffer,
    #[serde(rename = "blob")]
    Blob,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "text")]
    Text,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Empty => "",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
            ResponseType::Json => "json",
            ResponseType::Text => "text",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, ResponseType::Empty | ResponseType::Text)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = UnknownResponseType;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "" => Ok(ResponseType::Empty),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            "blob" => Ok(ResponseType::Blob),
            "document" => Ok(ResponseType::Document),
            "json" => Ok(ResponseType::Json),
            "text" => Ok(ResponseType::Text),
            other => Err(UnknownResponseType(other.to_string())),
        }
    }
}

/// Per-exchange options.
///
/// Options are values: the encoders that need a `Content-Type` header return
/// a new `RequestOptions` instead of editing the caller's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    headers: Option<Value>,
    response_type: ResponseType,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a loosely typed JSON object with the keys
    /// `headers`, `responseType` and `timeout` (or `timeoutMillis`).
    ///
    /// Unusable `responseType` and timeout values are logged and replaced by
    /// their defaults. `headers` is kept exactly as given; it is validated when
    /// the exchange applies it.
    pub fn from_value(value: &Value) -> Self {
        let mut options = Self::new();
        let Some(object) = value.as_object() else {
            if !value.is_null() {
                log::warn!("request options must be a mapping, got {value}; using defaults");
            }
            return options;
        };

        options.headers = object.get("headers").cloned();

        match object.get("responseType") {
            None => {}
            Some(Value::String(token)) => match token.parse() {
                Ok(response_type) => options.response_type = response_type,
                Err(err) => log::warn!("{err}; using the default response type"),
            },
            Some(other) => {
                log::warn!("responseType must be a string, got {other}; using the default")
            }
        }

        if let Some(timeout) = object.get("timeoutMillis").or_else(|| object.get("timeout")) {
            match timeout_from_value(timeout) {
                Some(timeout) => options.timeout = Some(timeout),
                None => log::warn!(
                    "timeout must be a non-negative number of milliseconds, got {timeout}; using the default"
                ),
            }
        }

        options
    }

    /// Add a single header, keeping any already present.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.edit_headers(|headers| {
            headers.insert(name, Value::String(value));
        });
        self
    }

    /// Replace the headers with a raw value, whatever its shape.
    pub fn with_headers_value(mut self, headers: Value) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set `Content-Type`, dropping any existing entry with the same name in
    /// any letter case.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.edit_headers(|headers| {
            headers.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
            headers.insert(CONTENT_TYPE.to_string(), Value::String(content_type.to_string()));
        });
        self
    }

    pub fn headers(&self) -> Option<&Value> {
        self.headers.as_ref()
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    fn edit_headers(&mut self, edit: impl FnOnce(&mut Map<String, Value>)) {
        let mut headers = match self.headers.take() {
            Some(Value::Object(headers)) => headers,
            Some(other) => {
                log::warn!("replacing non-mapping headers option {other} with a fresh mapping");
                Map::new()
            }
            None => Map::new(),
        };
        edit(&mut headers);
        self.headers = Some(Value::Object(headers));
    }
}

fn timeout_from_value(value: &Value) -> Option<Duration> {
    if let Some(millis) = value.as_u64() {
        return Some(Duration::from_millis(millis));
    }
    value
        .as_f64()
        .filter(|millis| millis.is_finite() && *millis >= 0.0)
        .map(|millis| Duration::from_millis(millis as u64))
}

/// Response payload interpreted per the declared [`ResponseType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
    ArrayBuffer(Vec<u8>),
    Blob(Vec<u8>),
    Document(String),
}

impl ResponseBody {
    /// Interpret raw payload bytes. A `json` payload that does not parse
    /// yields `None`, the same as an empty one.
    pub fn decode(response_type: ResponseType, bytes: Vec<u8>) -> Option<Self> {
        match response_type {
            ResponseType::Empty | ResponseType::Text => {
                Some(ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()))
            }
            ResponseType::Document => {
                Some(ResponseBody::Document(String::from_utf8_lossy(&bytes).into_owned()))
            }
            ResponseType::Json => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(ResponseBody::Json(value)),
                Err(err) => {
                    log::debug!("response is not valid JSON: {err}");
                    None
                }
            },
            ResponseType::ArrayBuffer => Some(ResponseBody::ArrayBuffer(bytes)),
            ResponseType::Blob => Some(ResponseBody::Blob(bytes)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) | ResponseBody::Document(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResponseBody::ArrayBuffer(bytes) | ResponseBody::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Which terminal path completed an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
    Timeout,
    Aborted,
}

/// The normalized result handed to the completion callback.
///
/// On every failure path `body` is `None`, `headers` is empty, `status` is the
/// transport's last known status and `status_text` names the failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub outcome: Outcome,
    pub body: Option<ResponseBody>,
    pub response_type: ResponseType,
    #[serde(rename = "finalURL")]
    pub final_url: String,
    #[serde(rename = "statusCode")]
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub(crate) fn failure(
        outcome: Outcome,
        message: &str,
        response_type: ResponseType,
        url: &str,
        status: u16,
    ) -> Self {
        Self {
            outcome,
            body: None,
            response_type,
            final_url: url.to_string(),
            status,
            status_text: message.to_string(),
            headers: BTreeMap::new(),
        }
    }
}
