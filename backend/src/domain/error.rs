//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps [`ErrorCode`]
//! to status codes; the batch dispatcher records the code string against the
//! failing item.

use serde::{Deserialize, Serialize};

use super::trace_id::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    BadRequest,
    /// The payload was not declared de-identified and PHI is not allowed.
    PhiNotAllowed,
    /// The requested provider is not registered.
    UnknownProvider,
    /// The requested provider is registered but not enabled.
    ProviderDisabled,
    /// A provider lacks the credentials or settings it needs.
    ConfigurationError,
    /// A vendor answered with a non-success status or could not be reached.
    UpstreamHttpError,
    /// A vendor answered with a payload that could not be understood.
    UpstreamParseError,
    /// An unexpected error occurred inside the gateway.
    InternalError,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::PhiNotAllowed => "phi_not_allowed",
            Self::UnknownProvider => "unknown_provider",
            Self::ProviderDisabled => "provider_disabled",
            Self::ConfigurationError => "configuration_error",
            Self::UpstreamHttpError => "upstream_http_error",
            Self::UpstreamParseError => "upstream_parse_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is never blank; a blank message is replaced by the code.
/// - `trace_id` is captured from the ambient [`TraceId`] on construction.
///
/// # Examples
/// ```
/// use ddx_gateway::domain::{Error, ErrorCode};
///
/// let err = Error::provider_disabled("provider 'isabel' is disabled");
/// assert_eq!(err.code(), ErrorCode::ProviderDisabled);
/// assert_eq!(err.code().as_str(), "provider_disabled");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Error {
    /// Create an error, capturing the current trace identifier if any.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.as_str().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was raised.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach an explicit trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Convenience constructor for [`ErrorCode::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::PhiNotAllowed`].
    pub fn phi_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PhiNotAllowed, message)
    }

    /// Convenience constructor for [`ErrorCode::UnknownProvider`].
    pub fn unknown_provider(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownProvider, message)
    }

    /// Convenience constructor for [`ErrorCode::ProviderDisabled`].
    pub fn provider_disabled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderDisabled, message)
    }

    /// Convenience constructor for [`ErrorCode::ConfigurationError`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// Convenience constructor for [`ErrorCode::UpstreamHttpError`].
    pub fn upstream_http(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamHttpError, message)
    }

    /// Convenience constructor for [`ErrorCode::UpstreamParseError`].
    pub fn upstream_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamParseError, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}
