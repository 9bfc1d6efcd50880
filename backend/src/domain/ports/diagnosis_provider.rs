//! Driven port implemented by every diagnostic reasoning engine.
//!
//! Providers receive a validated [`DiagnosticCase`] and return a
//! [`CanonicalResult`]. Vendor vocabularies never cross this boundary.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::retry::RetryableFailure;
use crate::domain::{CanonicalResult, DiagnosticCase, Error};

/// Per-request options forwarded to providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnoseOptions {
    /// Model override for generative providers; ignored by the others.
    pub model: Option<String>,
}

impl DiagnoseOptions {
    pub fn with_model(model: Option<String>) -> Self {
        Self { model }
    }
}

define_port_error! {
    /// Errors surfaced by diagnostic providers.
    pub enum DiagnosisProviderError {
        /// Credentials or settings required by the provider are missing.
        Configuration { message: String } =>
            "provider not configured: {message}",
        /// The vendor answered with a non-success status.
        UpstreamHttp { provider: String, status: u16, retry_after: Option<Duration> } =>
            "{provider} returned HTTP {status}",
        /// The vendor payload could not be interpreted.
        UpstreamParse { message: String } =>
            "upstream response could not be parsed: {message}",
        /// The vendor could not be reached.
        Transport { message: String } =>
            "upstream transport failed: {message}",
    }
}

impl RetryableFailure for DiagnosisProviderError {
    fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::UpstreamHttp { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<DiagnosisProviderError> for Error {
    fn from(value: DiagnosisProviderError) -> Self {
        let message = value.to_string();
        match value {
            DiagnosisProviderError::Configuration { .. } => Error::configuration(message),
            DiagnosisProviderError::UpstreamHttp { .. } | DiagnosisProviderError::Transport { .. } => {
                Error::upstream_http(message)
            }
            DiagnosisProviderError::UpstreamParse { .. } => Error::upstream_parse(message),
        }
    }
}

/// Port for producing a canonical diagnosis from a case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiagnosisProvider: Send + Sync {
    /// Diagnose one case.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use ddx_gateway::domain::DiagnosticCase;
    /// use ddx_gateway::domain::ports::{DiagnoseOptions, DiagnosisProvider};
    ///
    /// let case = DiagnosticCase::new("runny nose")?;
    /// let result = provider.diagnose(&case, &DiagnoseOptions::default()).await?;
    /// assert!(!result.engine.name.is_empty());
    /// ```
    async fn diagnose(
        &self,
        case: &DiagnosticCase,
        options: &DiagnoseOptions,
    ) -> Result<CanonicalResult, DiagnosisProviderError>;
}
