use reqwest::StatusCode;

/// Failure of a dispatched request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP call could not complete (DNS, connectivity, TLS).
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A response arrived with a non-success status. `message` follows the
    /// `errors` > `message` > status text precedence.
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// The body claimed to be JSON but did not parse, or the payload did not
    /// fit the requested type.
    #[error("Invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response parsed but broke the backend contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built (bad method, header, URL or path segment).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of a server-side failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
