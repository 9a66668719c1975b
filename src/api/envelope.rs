//! Interpretation of backend responses.
//!
//! The backend answers either with a bare JSON value or with an envelope
//! `{message?, data?, paging?, errors?}`. Callers do not declare which one
//! they expect; [`classify`] decides per response and the two resolver
//! modes build on that:
//!
//! - [`resolve_with_meta`]: the whole envelope, paging included
//! - [`resolve`]: just the payload, envelope or not
//!
//! Everything here is pure so the precedence and fallback rules can be
//! tested without a server.

use super::error::ApiError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys whose presence marks an object as an envelope.
pub const ENVELOPE_KEYS: [&str; 4] = ["message", "data", "paging", "errors"];

/// Status and parsed body of a received response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    /// `None` when the body was empty or not declared as JSON.
    pub payload: Option<Value>,
}

impl RawResponse {
    pub fn new(status: StatusCode, payload: Option<Value>) -> Self {
        Self { status, payload }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Reason phrase of the status, or the bare code when it has none.
    pub fn status_line(&self) -> String {
        self.status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| self.status.as_str().to_string())
    }
}

/// Envelope shape of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T, P> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<P>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl<T, P> Default for ResponseEnvelope<T, P> {
    fn default() -> Self {
        Self {
            message: None,
            data: None,
            paging: None,
            errors: None,
        }
    }
}

impl ResponseEnvelope<Value, Value> {
    /// Deserialize `data` and `paging` into concrete types.
    pub fn into_typed<T, P>(self) -> Result<ResponseEnvelope<T, P>, serde_json::Error>
    where
        T: DeserializeOwned,
        P: DeserializeOwned,
    {
        Ok(ResponseEnvelope {
            message: self.message,
            data: self.data.map(serde_json::from_value).transpose()?,
            paging: self.paging.map(serde_json::from_value).transpose()?,
            errors: self.errors,
        })
    }
}

/// Structural classification of a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Body with none of the envelope keys: the payload itself.
    Bare(Value),
    /// Object carrying at least one envelope key.
    Envelope(Map<String, Value>),
}

impl ResponseShape {
    /// Payload as seen by [`resolve`].
    ///
    /// An envelope with a `data` key yields that value, `null` included.
    /// An envelope without one yields the whole object.
    pub fn into_data(self) -> Value {
        match self {
            Self::Bare(value) => value,
            Self::Envelope(mut fields) => match fields.remove("data") {
                Some(data) => data,
                None => Value::Object(fields),
            },
        }
    }

    /// Body coerced into the envelope shape. A bare body lands in `data`.
    pub fn into_envelope(self) -> ResponseEnvelope<Value, Value> {
        match self {
            Self::Bare(value) => ResponseEnvelope {
                data: non_null(value),
                ..ResponseEnvelope::default()
            },
            Self::Envelope(mut fields) => ResponseEnvelope {
                message: fields.remove("message").and_then(text),
                data: fields.remove("data").and_then(non_null),
                paging: fields.remove("paging").and_then(non_null),
                errors: fields.remove("errors").and_then(text),
            },
        }
    }
}

/// Decide whether `payload` is an envelope or a bare value.
pub fn classify(payload: Value) -> ResponseShape {
    match payload {
        Value::Object(fields) if ENVELOPE_KEYS.iter().any(|k| fields.contains_key(*k)) => {
            ResponseShape::Envelope(fields)
        }
        other => ResponseShape::Bare(other),
    }
}

/// Message for a failed response: `errors`, else `message`, else the
/// status line. Empty strings do not count.
pub fn error_message(payload: Option<&Value>, status_line: &str) -> String {
    let field = |key: &str| payload.and_then(|p| p.get(key)).and_then(|v| text(v.clone()));
    field("errors")
        .or_else(|| field("message"))
        .unwrap_or_else(|| status_line.to_string())
}

/// Envelope mode: the full envelope on success, `ApiError::Http` otherwise.
pub fn resolve_with_meta(response: RawResponse) -> Result<ResponseEnvelope<Value, Value>, ApiError> {
    let payload = check_status(response)?;
    Ok(payload
        .map(|p| classify(p).into_envelope())
        .unwrap_or_default())
}

/// Payload mode: the envelope's `data` when there is one, the body itself
/// otherwise. An absent body resolves to `{}`.
pub fn resolve(response: RawResponse) -> Result<Value, ApiError> {
    let payload = check_status(response)?;
    Ok(match payload {
        Some(p) => classify(p).into_data(),
        None => Value::Object(Map::new()),
    })
}

fn check_status(response: RawResponse) -> Result<Option<Value>, ApiError> {
    if response.is_success() {
        return Ok(response.payload);
    }
    let message = error_message(response.payload.as_ref(), &response.status_line());
    Err(ApiError::Http {
        status: response.status,
        message,
        body: response.payload,
    })
}

fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

/// Text form of a message-like field. Structured values keep their JSON form.
fn text(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: Value) -> RawResponse {
        RawResponse::new(StatusCode::OK, Some(body))
    }

    fn failed(status: StatusCode, body: Option<Value>) -> RawResponse {
        RawResponse::new(status, body)
    }

    fn http_message(err: ApiError) -> String {
        match err {
            ApiError::Http { message, .. } => message,
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn errors_field_wins_over_message() {
        let err = resolve(failed(
            StatusCode::BAD_REQUEST,
            Some(json!({"errors": "bad input", "message": "ignored"})),
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "bad input");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn message_field_used_without_errors() {
        let err = resolve_with_meta(failed(
            StatusCode::NOT_FOUND,
            Some(json!({"message": "not found"})),
        ))
        .unwrap_err();
        assert_eq!(http_message(err), "not found");
    }

    #[test]
    fn status_line_used_without_body() {
        let err = resolve(failed(StatusCode::BAD_GATEWAY, None)).unwrap_err();
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[test]
    fn empty_fields_fall_through() {
        let body = json!({"errors": "", "message": null});
        assert_eq!(error_message(Some(&body), "Conflict"), "Conflict");
    }

    #[test]
    fn non_object_error_body_uses_status_line() {
        let body = json!(["a", "b"]);
        assert_eq!(
            error_message(Some(&body), "Internal Server Error"),
            "Internal Server Error"
        );
    }

    #[test]
    fn structured_errors_keep_json_text() {
        let body = json!({"errors": {"email": "required"}});
        assert_eq!(error_message(Some(&body), "x"), r#"{"email":"required"}"#);
    }

    #[test]
    fn unknown_status_line_falls_back_to_code() {
        let raw = RawResponse::new(StatusCode::from_u16(599).unwrap(), None);
        assert_eq!(raw.status_line(), "599");
    }

    #[test]
    fn payload_mode_unwraps_data() {
        let body = json!({"data": {"id": 1}, "paging": {"page": 1}});
        assert_eq!(resolve(ok(body)).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn meta_mode_keeps_paging() {
        let body = json!({"message": "ok", "data": {"id": 1}, "paging": {"page": 1}});
        let envelope = resolve_with_meta(ok(body)).unwrap();
        assert_eq!(envelope.message.as_deref(), Some("ok"));
        assert_eq!(envelope.data, Some(json!({"id": 1})));
        assert_eq!(envelope.paging, Some(json!({"page": 1})));
        assert!(envelope.errors.is_none());
    }

    #[test]
    fn bare_body_passes_through_payload_mode() {
        assert_eq!(resolve(ok(json!({"id": 1}))).unwrap(), json!({"id": 1}));
        assert_eq!(resolve(ok(json!([1, 2]))).unwrap(), json!([1, 2]));
    }

    #[test]
    fn explicit_null_data_differs_from_absent_data() {
        assert_eq!(resolve(ok(json!({"data": null}))).unwrap(), Value::Null);
        assert_eq!(
            resolve(ok(json!({"message": "done"}))).unwrap(),
            json!({"message": "done"})
        );
    }

    #[test]
    fn absent_body_resolves_to_empty_object() {
        let raw = RawResponse::new(StatusCode::NO_CONTENT, None);
        assert_eq!(resolve(raw.clone()).unwrap(), json!({}));
        assert_eq!(resolve_with_meta(raw).unwrap(), ResponseEnvelope::default());
    }

    #[test]
    fn meta_mode_places_bare_body_in_data() {
        let envelope = resolve_with_meta(ok(json!({"id": 1}))).unwrap();
        assert_eq!(envelope.data, Some(json!({"id": 1})));
        assert!(envelope.paging.is_none());
    }

    #[test]
    fn classify_detects_any_envelope_key() {
        for key in ENVELOPE_KEYS {
            let mut fields = Map::new();
            fields.insert(key.to_string(), json!("x"));
            assert!(matches!(
                classify(Value::Object(fields)),
                ResponseShape::Envelope(_)
            ));
        }
        assert!(matches!(classify(json!({"id": 1})), ResponseShape::Bare(_)));
        assert!(matches!(classify(json!("text")), ResponseShape::Bare(_)));
    }

    #[test]
    fn typed_envelope_conversion() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: u32,
        }
        #[derive(Debug, Deserialize, PartialEq)]
        struct Page {
            page: u32,
        }

        let envelope = resolve_with_meta(ok(json!({"data": [{"id": 7}], "paging": {"page": 2}})))
            .unwrap()
            .into_typed::<Vec<Item>, Page>()
            .unwrap();
        assert_eq!(envelope.data, Some(vec![Item { id: 7 }]));
        assert_eq!(envelope.paging, Some(Page { page: 2 }));
    }
}
