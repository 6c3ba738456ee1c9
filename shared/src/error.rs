use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Storage,
    Serialization,
    Deserialization,
    Configuration,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Storage | Self::Conflict
        )
    }

    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Authorization,
            404 => Self::NotFound,
            408 => Self::Timeout,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// The one error the model carries for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let message = body
            .and_then(ApiErrorResponse::parse)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(ErrorKind::from_status(status), message)
            .with_context("http_status", status.to_string())
    }

    #[must_use]
    pub fn from_http(error: &crux_http::Error) -> Self {
        match error {
            crux_http::Error::Http(http) => {
                Self::from_http_status(u16::from(http.code), http.body.as_deref())
            }
            crux_http::Error::Json(e) => {
                Self::new(ErrorKind::Deserialization, "Unexpected response from server")
                    .with_internal(e.clone())
            }
            crux_http::Error::Url(e) => {
                Self::new(ErrorKind::Configuration, "Invalid backend address")
                    .with_internal(e.clone())
            }
            crux_http::Error::Io(e) => {
                Self::new(ErrorKind::Network, "Unable to reach the server")
                    .with_internal(e.clone())
            }
            crux_http::Error::Timeout => Self::new(ErrorKind::Timeout, "The request timed out"),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// Error bodies from the REST and auth endpoints use different field names.
#[derive(Debug, Clone, Default, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiErrorResponse {
    fn parse(body: &[u8]) -> Option<String> {
        let parsed = serde_json::from_slice::<Self>(body).ok()?;
        [parsed.error_description, parsed.msg, parsed.message, parsed.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} is not a valid link: {reason}")]
    InvalidLink { field: &'static str, reason: String },
    #[error("progress {0} is outside 0-100")]
    ProgressOutOfRange(u8),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("backend url {url:?} is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("backend configuration is incomplete: {missing} is not set")]
    Incomplete { missing: &'static str },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Internal);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Unknown);
    }

    #[test]
    fn http_status_prefers_auth_error_description() {
        let body = br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let err = AppError::from_http_status(400, Some(body));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Invalid login credentials");
        assert_eq!(err.context.get("http_status").map(String::as_str), Some("400"));
    }

    #[test]
    fn http_status_reads_rest_message() {
        let body = br#"{"code":"42501","message":"permission denied for table vision_wishes"}"#;
        let err = AppError::from_http_status(403, Some(body));
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(err.message, "permission denied for table vision_wishes");
    }

    #[test]
    fn http_status_without_body_has_generic_message() {
        let err = AppError::from_http_status(500, None);
        assert_eq!(err.message, "HTTP error: 500");
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_errors_are_retryable() {
        let err = AppError::from_http(&crux_http::Error::Io("connection reset".into()));
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.is_retryable());
        assert!(AppError::from_http(&crux_http::Error::Timeout).is_retryable());
    }

    #[test]
    fn display_includes_code_and_internal() {
        let err = AppError::new(ErrorKind::Network, "offline").with_internal("dns");
        assert_eq!(err.to_string(), "[NETWORK_ERROR] offline (internal: dns)");
    }

    #[test]
    fn password_messages_match_auth_form_copy() {
        assert_eq!(ValidationError::PasswordMismatch.to_string(), "Passwords do not match");
        assert_eq!(
            ValidationError::PasswordTooShort { min: 6 }.to_string(),
            "Password must be at least 6 characters"
        );
    }
}
