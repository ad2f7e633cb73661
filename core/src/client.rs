//! Verb entry points and the exchange lifecycle controller.
//!
//! # Design
//! `HttpClient` holds only a transport factory and its defaults and carries no
//! mutable state between calls. `get`, `post`, `json` and `form` shape their
//! arguments and converge on [`HttpClient::request`], which opens a fresh
//! transport, configures it, arms the exchange handler and sends. The call
//! returns as soon as the transport has the exchange; the outcome arrives
//! later through the callback, exactly once, whatever path the transport
//! takes.

use serde::Serialize;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::encode::{encode_form, encode_json, FormValue};
use crate::exchange::{ExchangeHandler, BODY_NOT_ENCODED, REQUEST_ERROR};
use crate::headers::apply_request_headers;
use crate::http::{HttpMethod, RequestBody};
use crate::transport::{Transport, TransportFactory};
use crate::types::{Outcome, RequestOptions, Response};

/// Stateless single-exchange HTTP helper.
///
/// Every method returns the exchange id used in log lines; the response is
/// delivered to `callback`.
#[derive(Debug, Clone)]
pub struct HttpClient<F> {
    factory: F,
    config: ClientConfig,
}

impl<F: TransportFactory> HttpClient<F> {
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, ClientConfig::default())
    }

    pub fn with_config(factory: F, config: ClientConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get<C>(&self, url: &str, options: RequestOptions, callback: C) -> Uuid
    where
        C: FnOnce(Response) + Send + 'static,
    {
        self.request(HttpMethod::Get, url, None, options, callback)
    }

    pub fn post<C>(
        &self,
        url: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
        callback: C,
    ) -> Uuid
    where
        C: FnOnce(Response) + Send + 'static,
    {
        self.request(HttpMethod::Post, url, body, options, callback)
    }

    /// POST `data` as JSON. The `Content-Type` header is always
    /// `application/json;charset=UTF-8`, whatever `options` said.
    pub fn json<T, C>(&self, url: &str, data: &T, options: RequestOptions, callback: C) -> Uuid
    where
        T: Serialize + ?Sized,
        C: FnOnce(Response) + Send + 'static,
    {
        match encode_json(data) {
            Ok(encoded) => {
                let (body, options) = encoded.apply(options);
                self.post(url, Some(body), options, callback)
            }
            Err(err) => {
                log::error!("JSON body for {url} could not be encoded: {err}");
                let mut handler =
                    ExchangeHandler::new(url, options.response_type(), Box::new(callback));
                handler.fail(Outcome::Error, BODY_NOT_ENCODED, 0);
                handler.id()
            }
        }
    }

    /// POST `fields` URL-encoded. The `Content-Type` header is always
    /// `application/x-www-form-urlencoded;charset=UTF-8`.
    pub fn form<I, K, V, C>(&self, url: &str, fields: I, options: RequestOptions, callback: C) -> Uuid
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FormValue>,
        C: FnOnce(Response) + Send + 'static,
    {
        let (body, options) = encode_form(fields).apply(options);
        self.post(url, Some(body), options, callback)
    }

    /// Run one exchange with any method.
    pub fn request<C>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
        callback: C,
    ) -> Uuid
    where
        C: FnOnce(Response) + Send + 'static,
    {
        let mut handler = ExchangeHandler::new(url, options.response_type(), Box::new(callback));
        let id = handler.id();
        log::debug!("exchange {id}: {method} {url}");

        let mut transport = self.factory.create();
        if let Err(err) = transport.open(method, url) {
            log::warn!("exchange {id}: {err}");
            handler.fail(Outcome::Error, REQUEST_ERROR, 0);
            return id;
        }

        let applied = apply_request_headers(&mut transport, options.headers());
        log::trace!("exchange {id}: {applied} request headers applied");
        transport.set_timeout(options.effective_timeout(self.config.default_timeout));
        transport.set_response_type(options.response_type());

        handler.mark_sent();
        transport.send(body, handler);
        id
    }
}
