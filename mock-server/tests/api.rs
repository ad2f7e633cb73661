use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, BodyEcho, RequestEcho};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn body_request(method: &str, uri: &str, content_type: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- get ---

#[tokio::test]
async fn get_echoes_args_and_headers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/get?a=1&b=two")
                .header("X-Custom", "custom")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: RequestEcho = body_json(resp).await;
    assert_eq!(echo.url, "/get?a=1&b=two");
    assert_eq!(echo.args["a"], "1");
    assert_eq!(echo.args["b"], "two");
    assert_eq!(echo.headers["x-custom"], "custom");
}

// --- post / anything ---

#[tokio::test]
async fn post_echoes_form_body() {
    let resp = app()
        .oneshot(body_request(
            "POST",
            "/post",
            "application/x-www-form-urlencoded;charset=UTF-8",
            "foo=bar&baz=42",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: BodyEcho = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.data, "foo=bar&baz=42");
    assert_eq!(echo.form["foo"], "bar");
    assert_eq!(echo.form["baz"], "42");
    assert!(echo.json.is_none());
}

#[tokio::test]
async fn post_echoes_json_body() {
    let resp = app()
        .oneshot(body_request(
            "POST",
            "/post",
            "application/json;charset=UTF-8",
            r#"{"foo":"bar","baz":42}"#,
        ))
        .await
        .unwrap();

    let echo: BodyEcho = body_json(resp).await;
    assert_eq!(echo.json, Some(serde_json::json!({"foo": "bar", "baz": 42})));
    assert!(echo.form.is_empty());
}

#[tokio::test]
async fn post_route_rejects_get() {
    let resp = app().oneshot(get("/post")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn anything_accepts_any_method() {
    let resp = app()
        .oneshot(body_request("PATCH", "/anything?x=1", "text/plain", "raw"))
        .await
        .unwrap();

    let echo: BodyEcho = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.args["x"], "1");
    assert_eq!(echo.data, "raw");
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    let resp = app().oneshot(get("/status/404")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app().oneshot(get("/status/418")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn status_rejects_non_numeric_code() {
    let resp = app().oneshot(get("/status/teapot")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- delay ---

#[tokio::test]
async fn zero_delay_answers_like_get() {
    let resp = app().oneshot(get("/delay/0?a=1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let echo: RequestEcho = body_json(resp).await;
    assert_eq!(echo.args["a"], "1");
}

// --- bytes ---

#[tokio::test]
async fn bytes_returns_requested_length() {
    let resp = app().oneshot(get("/bytes/300")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/octet-stream");
    let body = body_bytes(resp).await;
    assert_eq!(body.len(), 300);
    assert_eq!(body[0], 0);
    assert_eq!(body[256], 0);
    assert_eq!(body[299], 43);
}

#[tokio::test]
async fn bytes_rejects_oversized_requests() {
    let resp = app().oneshot(get("/bytes/999999999999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- response headers ---

#[tokio::test]
async fn response_headers_appends_repeated_names() {
    let resp = app()
        .oneshot(get("/response-headers?Set-Cookie=a%3D1&Set-Cookie=b%3D2&X-A=1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookies: Vec<&str> = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
    assert_eq!(resp.headers()["x-a"], "1");
}

#[tokio::test]
async fn response_headers_rejects_invalid_names() {
    let resp = app()
        .oneshot(get("/response-headers?bad%20name=1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- redirect ---

#[tokio::test]
async fn redirect_to_sets_location() {
    let resp = app().oneshot(get("/redirect-to?url=%2Fget")).await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[http::header::LOCATION], "/get");
}
