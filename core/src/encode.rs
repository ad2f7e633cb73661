//! Body encoders for form and JSON payloads.
//!
//! Each encoder yields the body text together with the content type it must
//! be sent with. [`EncodedBody::apply`] pairs the body with options carrying
//! that content type, overwriting whatever `Content-Type` the caller set.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::EncodeError;
use crate::http::RequestBody;
use crate::types::RequestOptions;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Bytes escaped in a URL component: everything except alphanumerics and
/// `-_.!~*'()`. Spaces become `%20`, never `+`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A form field value: text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Text(text) => f.write_str(text),
            FormValue::Integer(n) => write!(f, "{n}"),
            FormValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FormValue {
    fn from(text: &str) -> Self {
        FormValue::Text(text.to_string())
    }
}

impl From<String> for FormValue {
    fn from(text: String) -> Self {
        FormValue::Text(text)
    }
}

impl From<f64> for FormValue {
    fn from(n: f64) -> Self {
        FormValue::Float(n)
    }
}

macro_rules! form_value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FormValue {
                fn from(n: $t) -> Self {
                    FormValue::Integer(i64::from(n))
                }
            }
        )*
    };
}

form_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// An encoded request body and the content type it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: String,
    pub content_type: &'static str,
}

impl EncodedBody {
    /// Hand back the body and a copy of `options` whose `Content-Type` is
    /// this body's content type.
    pub fn apply(self, options: RequestOptions) -> (RequestBody, RequestOptions) {
        let options = options.with_content_type(self.content_type);
        (RequestBody::Text(self.body), options)
    }
}

/// Encode fields as `application/x-www-form-urlencoded`, keeping their order.
pub fn encode_form<I, K, V>(fields: I) -> EncodedBody
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<FormValue>,
{
    let pairs: Vec<String> = fields
        .into_iter()
        .map(|(key, value)| {
            let value = value.into().to_string();
            format!("{}={}", escape(key.as_ref()), escape(&value))
        })
        .collect();

    EncodedBody {
        body: pairs.join("&"),
        content_type: FORM_CONTENT_TYPE,
    }
}

/// Encode `value` as JSON text.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<EncodedBody, EncodeError> {
    Ok(EncodedBody {
        body: serde_json::to_string(value)?,
        content_type: JSON_CONTENT_TYPE,
    })
}

fn escape(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}
