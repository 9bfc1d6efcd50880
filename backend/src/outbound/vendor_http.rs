//! Reqwest-backed JSON transport shared by the vendor adapters.
//!
//! This module owns transport details only: authorisation headers, timeout,
//! status mapping and `Retry-After` extraction. Payload shapes live with each
//! vendor adapter.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::domain::ports::DiagnosisProviderError;

/// Connection settings for one vendor endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorConnection {
    /// Fully resolved endpoint URL.
    pub endpoint: Url,
    /// Header carrying the credential, e.g. `Authorization`.
    pub auth_header: String,
    /// Optional scheme prepended to the credential, e.g. `Bearer`.
    pub auth_prefix: String,
    /// Vendor credential.
    pub api_key: String,
    /// Additional static headers, e.g. `App-Id`.
    pub extra_headers: Vec<(String, String)>,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// Log outbound payloads and response bodies at `debug`.
    pub debug: bool,
}

/// Errors raised while constructing a [`VendorHttpClient`].
#[derive(Debug, thiserror::Error)]
pub enum VendorClientError {
    #[error("invalid header name '{name}'")]
    InvalidHeaderName { name: String },
    #[error("invalid value for header '{name}'")]
    InvalidHeaderValue { name: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// JSON POST client bound to one vendor endpoint.
#[derive(Debug, Clone)]
pub struct VendorHttpClient {
    provider: &'static str,
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
    auth_header: String,
    debug: bool,
}

impl VendorHttpClient {
    /// Build a client with its authorisation and static headers.
    ///
    /// # Errors
    /// Returns [`VendorClientError`] for unusable header names or values and
    /// when the reqwest client cannot be constructed.
    pub fn new(
        provider: &'static str,
        connection: VendorConnection,
    ) -> Result<Self, VendorClientError> {
        let VendorConnection {
            endpoint,
            auth_header,
            auth_prefix,
            api_key,
            extra_headers,
            timeout,
            debug,
        } = connection;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, &auth_header, &auth_value(&auth_prefix, &api_key))?;
        for (name, value) in &extra_headers {
            insert_header(&mut headers, name, value)?;
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            provider,
            client,
            endpoint,
            headers,
            auth_header,
            debug,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Perform one POST attempt and return the raw success body.
    ///
    /// # Errors
    /// Returns `UpstreamHttp` for non-2xx statuses and `Transport` when the
    /// vendor cannot be reached.
    pub async fn post_json<B>(&self, body: &B) -> Result<Vec<u8>, DiagnosisProviderError>
    where
        B: Serialize + Sync + ?Sized,
    {
        if self.debug {
            let payload = serde_json::to_string(body).unwrap_or_default();
            debug!(
                provider = self.provider,
                url = %self.endpoint,
                auth_header = %self.auth_header,
                credential = "<redacted>",
                payload = %payload,
                "vendor request"
            );
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.bytes().await.map_err(map_transport_error)?;
        if self.debug {
            debug!(
                provider = self.provider,
                status = status.as_u16(),
                body = %body_preview(body.as_ref()),
                "vendor response"
            );
        }
        if !status.is_success() {
            return Err(map_status_error(self.provider, status, retry_after));
        }
        Ok(body.to_vec())
    }
}

/// How a vendor adapter answers requests.
#[derive(Debug, Clone)]
pub enum VendorMode {
    /// Canned offline answers.
    Mock,
    /// Real calls through the bound client.
    Live(VendorHttpClient),
    /// Credentials are missing; every call fails with a configuration error.
    Unconfigured { reason: String },
}

impl VendorMode {
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self::Unconfigured {
            reason: reason.into(),
        }
    }
}

fn auth_value(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix} {key}")
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), VendorClientError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| VendorClientError::InvalidHeaderName {
            name: name.to_owned(),
        })?;
    let mut header_value =
        HeaderValue::from_str(value).map_err(|_| VendorClientError::InvalidHeaderValue {
            name: name.to_owned(),
        })?;
    header_value.set_sensitive(true);
    headers.insert(header_name, header_value);
    Ok(())
}

/// Seconds-valued `Retry-After`; zero, HTTP dates and junk are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
}

fn map_transport_error(error: reqwest::Error) -> DiagnosisProviderError {
    if error.is_timeout() {
        DiagnosisProviderError::transport(format!("request timed out: {error}"))
    } else {
        DiagnosisProviderError::transport(error.to_string())
    }
}

fn map_status_error(
    provider: &'static str,
    status: StatusCode,
    retry_after: Option<Duration>,
) -> DiagnosisProviderError {
    DiagnosisProviderError::upstream_http(provider, status.as_u16(), retry_after)
}

/// Whitespace-compacted, length-capped view of a response body for logs.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
