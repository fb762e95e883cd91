use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Request-terminal errors for the proxy endpoint.
///
/// The 400 response bodies are part of the contract; callers and tests
/// match on the exact text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// Malformed or inverted `range` parameter.
    #[error("Bad byte range")]
    InvalidRange,

    /// The `s` parameter is required.
    #[error("Source string not provided")]
    MissingSource,

    /// The source did not parse as an absolute URL.
    #[error("Bad source string")]
    InvalidSource,

    /// The capability probe could not reach the source at all.
    #[error("Bad source string, does not support range requests")]
    UnreachableSource,

    /// The source answered the probe without advertising byte ranges.
    #[error("Source does not accept range requests")]
    RangeUnsupported,

    /// Network or IO failure while fetching from the origin.
    #[error("origin transport failed: {0}")]
    OriginTransport(String),

    /// The origin did not honor the range request with partial content.
    #[error("origin answered {0} instead of partial content")]
    UnexpectedOriginStatus(u16),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRange
            | ProxyError::MissingSource
            | ProxyError::InvalidSource
            | ProxyError::UnreachableSource
            | ProxyError::RangeUnsupported => StatusCode::BAD_REQUEST,
            ProxyError::OriginTransport(_) | ProxyError::UnexpectedOriginStatus(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::BAD_REQUEST {
            format!("{self}\n")
        } else {
            // Transport details stay in the logs, not the response.
            tracing::error!(error = %self, "origin failure");
            "Internal Server Error\n".to_string()
        };
        (status, body).into_response()
    }
}
