//! Error types for authentication and API operations.
//!
//! Every failure surfaced by this crate is a [`GbpError`]. Authentication
//! problems never carry an HTTP status; API failures always carry the raw
//! response body so callers can inspect what upstream said.

use std::io;

use thiserror::Error;

/// A specialized Result type for toolkit operations.
pub type GbpResult<T> = Result<T, GbpError>;

/// Errors raised by the auth handler, API client and profile manager.
#[derive(Debug, Error)]
pub enum GbpError {
    /// Credential, consent or refresh failure.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Transport failure or non-2xx response.
    ///
    /// `status` is `None` when the request never produced a response.
    #[error("API error{}: {message}", status_suffix(.status))]
    Api {
        message: String,
        status: Option<u16>,
        body: String,
    },

    /// The caller passed arguments the operation cannot accept.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// IO error (token file, config file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl GbpError {
    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// The error returned when an API method runs before `authenticate()`.
    pub fn not_authenticated() -> Self {
        Self::auth("not authenticated - call authenticate() first")
    }

    /// Creates an API error for a response with the given status and body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::Api {
            message: summarize_body(&body),
            status: Some(status),
            body,
        }
    }

    /// Creates an API error for a request that never got a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status: None,
            body: String::new(),
        }
    }

    /// Creates an API error for a 2xx response that could not be decoded.
    pub fn invalid_response(status: u16, body: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Api {
            message: format!("invalid response: {}", reason.into()),
            status: Some(status),
            body: body.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status of an API error, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw response body of an API error.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Pulls `error.message` out of a Google JSON error body, falling back to the
/// (truncated) body itself.
fn summarize_body(body: &str) -> String {
    const MAX_LEN: usize = 200;

    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    if let Some(message) = from_json {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
