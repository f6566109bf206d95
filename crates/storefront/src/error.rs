//! Errors returned by the storefront client.
//!
//! Every failure carries a [`FailureKind`] so callers can decide what the
//! user sees: fix the input, retry with the same idempotency key, or go back
//! and change the order.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::session::SessionError;
use crate::validate::ValidationError;

/// How a failure should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Rejected locally before any request was sent.
    Validation,
    /// Network trouble or a server-side fault. Safe to retry with the same key.
    Transient,
    /// The backend refused the request. Retrying the same payload will not help.
    Permanent,
    /// The backend answered an idempotent call with a body that could not be
    /// read, so the request may have taken effect. Retry with the same key to
    /// learn the outcome; never resend it under a new key.
    Unconfirmed,
}

impl FailureKind {
    /// Whether the same request may be sent again with the same key.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::Unconfirmed)
    }
}

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload failed local validation.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The operation needs a signed-in member.
    #[error("sign in required")]
    NotSignedIn,

    /// The signed-in member lacks the role the operation needs.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request never produced a response (connect failure, timeout,
    /// interrupted body).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend rejected the session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// A success response did not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An idempotent call was answered but its outcome could not be read.
    #[error("outcome unknown: {0}")]
    Unconfirmed(String),

    /// A request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// The session could not be persisted.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Classify the failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) | Self::NotSignedIn => FailureKind::Validation,
            Self::Network(_) => FailureKind::Transient,
            Self::Unconfirmed(_) => FailureKind::Unconfirmed,
            Self::Status { status, .. } if is_transient_status(*status) => FailureKind::Transient,
            Self::Forbidden(_)
            | Self::Unauthorized(_)
            | Self::Status { .. }
            | Self::MalformedResponse(_)
            | Self::Encode(_)
            | Self::Url(_)
            | Self::Client(_)
            | Self::Session(_) => FailureKind::Permanent,
        }
    }

    /// Whether re-sending the identical request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// HTTP status, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Mark an unreadable success body of an idempotent call as unconfirmed.
    #[must_use]
    pub(crate) fn unconfirmed_if_malformed(self) -> Self {
        match self {
            Self::MalformedResponse(detail) => Self::Unconfirmed(detail),
            other => other,
        }
    }

    /// Build an error from a non-success response body.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body);
        if status == StatusCode::UNAUTHORIZED {
            return Self::Unauthorized(message);
        }
        if status == StatusCode::FORBIDDEN {
            return Self::Forbidden(message);
        }
        Self::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// 5xx, request timeout, and rate limiting are worth another attempt.
const fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Error body shape used by the backend (`{"message": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn extract_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    trimmed.chars().take(200).collect()
}
