use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

/// Longest delay `/delay/{secs}` will honor.
const MAX_DELAY_SECS: f64 = 10.0;

/// Largest payload `/bytes/{n}` will produce.
const MAX_BYTES: usize = 64 * 1024 * 1024;

/// Echo of a body-less request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestEcho {
    pub url: String,
    pub args: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
}

/// Echo of a request carrying a body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyEcho {
    pub method: String,
    pub url: String,
    pub args: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub data: String,
    pub form: BTreeMap<String, String>,
    pub json: Option<Value>,
}

#[derive(Deserialize)]
pub struct RedirectTarget {
    pub url: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/get", get(echo_request))
        .route("/post", post(echo_body))
        .route("/anything", any(echo_body))
        .route("/status/{code}", any(status))
        .route("/delay/{secs}", get(delay))
        .route("/bytes/{n}", get(sized_bytes))
        .route("/response-headers", get(response_headers))
        .route("/redirect-to", get(redirect_to))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo_request(
    uri: Uri,
    Query(args): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Json<RequestEcho> {
    Json(RequestEcho {
        url: uri.to_string(),
        args,
        headers: header_map(&headers),
    })
}

async fn echo_body(
    method: Method,
    uri: Uri,
    Query(args): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<BodyEcho> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let form = if content_type.starts_with("application/x-www-form-urlencoded") {
        parse_form(&body)
    } else {
        BTreeMap::new()
    };
    let json = if content_type.starts_with("application/json") {
        serde_json::from_slice(&body).ok()
    } else {
        None
    };

    Json(BodyEcho {
        method: method.to_string(),
        url: uri.to_string(),
        args,
        headers: header_map(&headers),
        data: String::from_utf8_lossy(&body).into_owned(),
        form,
        json,
    })
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn delay(
    Path(secs): Path<f64>,
    uri: Uri,
    Query(args): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Json<RequestEcho> {
    let secs = if secs.is_finite() { secs.clamp(0.0, MAX_DELAY_SECS) } else { 0.0 };
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    echo_request(uri, Query(args), headers).await
}

/// Answer with `n` bytes cycling through `0..=255`.
async fn sized_bytes(Path(n): Path<usize>) -> Response {
    if n > MAX_BYTES {
        return (StatusCode::BAD_REQUEST, format!("at most {MAX_BYTES} bytes")).into_response();
    }
    let body: Vec<u8> = (0..=u8::MAX).cycle().take(n).collect();
    ([(header::CONTENT_TYPE, "application/octet-stream")], body).into_response()
}

/// Answer with every query pair as a response header, appending repeated
/// names instead of replacing them.
async fn response_headers(Query(pairs): Query<Vec<(String, String)>>) -> Response {
    let mut headers = HeaderMap::new();
    for (name, value) in &pairs {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            return (StatusCode::BAD_REQUEST, format!("invalid header {name:?}")).into_response();
        };
        headers.append(name, value);
    }
    (headers, Json(pairs)).into_response()
}

async fn redirect_to(Query(target): Query<RedirectTarget>) -> Redirect {
    Redirect::to(&target.url)
}

/// Flatten request headers into a mapping, joining repeated names with `", "`.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    map
}

fn parse_form(body: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(body).into_owned().collect()
}
