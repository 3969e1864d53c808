//! API error types and error-body normalization.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`ApiClient`](super::ApiClient) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, DNS, TLS, ...).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response with a readable error body.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Non-2xx response whose body is not a JSON error document.
    #[error("Malformed server response (status {status})")]
    MalformedResponse { status: u16, body: String },

    /// 2xx response whose body does not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The request could not be built locally.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status, when the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } | ApiError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => None,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Turn a failed response into an [`ApiError`].
///
/// `details` wins over `message`. A `details` object of field messages is
/// rendered as `field: message` pairs sorted by field. When neither is
/// usable the status reason phrase is used.
pub(crate) fn from_error_body(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return ApiError::MalformedResponse {
                status,
                body: body.to_string(),
            };
        }
    };

    let message = parsed
        .details
        .as_ref()
        .and_then(render_details)
        .or_else(|| parsed.message.filter(|m| !m.trim().is_empty()))
        .unwrap_or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map_or_else(
                    || format!("Request failed with status {status}"),
                    str::to_string,
                )
        });

    ApiError::Server { status, message }
}

fn render_details(details: &Value) -> Option<String> {
    let rendered = match details {
        Value::String(s) => s.clone(),
        Value::Object(fields) => {
            let mut pairs: Vec<(&String, String)> = fields
                .iter()
                .map(|(field, message)| (field, value_text(message)))
                .collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            pairs
                .into_iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("; ")
        }
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join("; "),
        _ => return None,
    };

    (!rendered.trim().is_empty()).then_some(rendered)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
