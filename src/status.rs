//! Structured status errors — the single error-to-status mapping both the
//! runtime dispatcher and the build-time sentinel-error derivation share.

use http::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A business error resolved to an HTTP status code.
///
/// `StatusError` is both the runtime wire shape (encoded as the JSON body of
/// an error response) and the build-time schema registered for documented
/// error responses.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "StatusError")]
pub struct StatusError {
    /// The HTTP status code for this occurrence.
    pub status: u16,
    /// Short machine-readable summary, e.g. `"not_found"`.
    pub summary: String,
    /// Human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Optional machine-usable payload attached by the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl StatusError {
    pub fn new(status: StatusCode, summary: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            summary: summary.into(),
            detail: String::new(),
            payload: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The status as a typed `StatusCode`; malformed codes degrade to 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Resolve an arbitrary error to a `StatusError`.
    ///
    /// Walks the error and its `source()` chain looking for a `StatusError`
    /// to clone; anything else maps to a 500 `internal` carrying the error's
    /// display text. This is the collaborator used by the dispatcher at
    /// request time and by the document builder for sentinel errors.
    pub fn from_err(err: &(dyn std::error::Error + 'static)) -> StatusError {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(se) = e.downcast_ref::<StatusError>() {
                return se.clone();
            }
            current = e.source();
        }
        StatusError::internal(err.to_string())
    }

    // Convenience constructors for the common cases.

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request").with_detail(detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found").with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict").with_detail(detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal").with_detail(detail)
    }
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{} ({})", self.summary, self.status)
        } else {
            write!(f, "{} ({}): {}", self.summary, self.status, self.detail)
        }
    }
}

impl std::error::Error for StatusError {}
