//! Outgoing requests against the configured backend.
//!
//! Each call issues exactly one HTTP request: no retries, no timeout of its
//! own, no coalescing. The bearer token is read from the session before the
//! request is sent, so a concurrent logout does not affect a request that is
//! already in flight.

use super::envelope::{self, RawResponse, ResponseEnvelope};
use super::error::ApiError;
use crate::auth::SessionStore;
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-call request settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// HTTP method, case-insensitive.
    pub method: String,
    /// JSON body. `None` and `Some(Value::Null)` both send no body.
    pub body: Option<Value>,
    /// Extra headers. They override the defaults, except that an attached
    /// bearer token replaces any `Authorization` given here.
    pub headers: BTreeMap<String, String>,
    /// Attach the session token when one is held.
    pub auth_required: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".into(),
            body: None,
            headers: BTreeMap::new(),
            auth_required: true,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self::default().method("POST")
    }

    pub fn put() -> Self {
        Self::default().method("PUT")
    }

    pub fn delete() -> Self {
        Self::default().method("DELETE")
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Never attach the bearer token (login, register, health).
    pub fn without_auth(mut self) -> Self {
        self.auth_required = false;
        self
    }
}

/// Sends requests to `base_url + path` on behalf of a session.
pub struct RequestDispatcher {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl RequestDispatcher {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http, base_url, session))
    }

    /// Use a preconfigured HTTP client (proxies, timeouts imposed by the caller).
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Issue one request and return its status and parsed JSON body without
    /// judging the status.
    pub async fn send(&self, path: &str, options: RequestOptions) -> Result<RawResponse, ApiError> {
        self.session.init();

        let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("method '{}'", options.method)))?;
        let url_text = format!("{}{}", self.base_url, path);
        let url = Url::parse(&url_text)
            .map_err(|e| ApiError::InvalidRequest(format!("url '{url_text}': {e}")))?;

        let token = if options.auth_required {
            self.session.token()
        } else {
            None
        };
        let headers = build_headers(&options.headers, token.as_deref())?;

        tracing::debug!(
            method = %method,
            url = %url,
            authenticated = token.is_some(),
            "Dispatching request"
        );

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = options.body.as_ref().filter(|b| !b.is_null()) {
            let text = serde_json::to_string(body).map_err(ApiError::Encode)?;
            request = request.body(text);
        }

        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));
        let bytes = response.bytes().await.map_err(ApiError::Transport)?;

        let payload = if is_json && !bytes.is_empty() {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) if status.is_success() => return Err(ApiError::Decode(e)),
                // A garbled error body still reports the status.
                Err(_) => None,
            }
        } else {
            None
        };

        Ok(RawResponse::new(status, payload))
    }

    /// Send and resolve to the payload: envelope `data` when present, the
    /// bare body otherwise.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let raw = self.send(path, options).await?;
        let value = envelope::resolve(raw)?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    /// Send and resolve to the full envelope, paging included.
    pub async fn request_with_meta<T, P>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope<T, P>, ApiError>
    where
        T: DeserializeOwned,
        P: DeserializeOwned,
    {
        let raw = self.send(path, options).await?;
        envelope::resolve_with_meta(raw)?
            .into_typed()
            .map_err(ApiError::Decode)
    }
}

fn build_headers(
    extra: &BTreeMap<String, String>,
    token: Option<&str>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    for (name, value) in extra {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("header name '{name}'")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::InvalidRequest(format!("header value for '{name}'")))?;
        headers.insert(header_name, header_value);
    }

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidRequest("session token is not a valid header value".into()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

// ── Tests ───────────────────────────────────────────────────────
