//! Domain service routing cases to registered providers.
//!
//! Single requests fail fast; batches isolate per-item failures and report
//! them by index.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::DiagnoseOptions;
use super::registry::ProviderRegistry;
use super::{CanonicalResult, DiagnosticCase, Error};

mod batch;

pub use batch::{BatchItem, BatchReport, BatchRequest, BatchResult, BatchSummary};

/// Default number of concurrent batch workers.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

/// Provider routing for single and batch diagnoses.
#[derive(Clone)]
pub struct DiagnosisService {
    registry: Arc<ProviderRegistry>,
    concurrency: usize,
}

impl DiagnosisService {
    /// Build a service; a concurrency below one is raised to one.
    pub fn new(registry: Arc<ProviderRegistry>, concurrency: usize) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Diagnose one case with the named provider, or the default.
    ///
    /// # Errors
    /// Returns `unknown_provider`/`provider_disabled` for bad names and the
    /// mapped provider error when the provider fails.
    ///
    /// # Examples
    /// ```rust,ignore
    /// let result = service
    ///     .diagnose(&case, Some("local_rules"), DiagnoseOptions::default())
    ///     .await?;
    /// assert_eq!(result.engine.name, "local_rules");
    /// ```
    pub async fn diagnose(
        &self,
        case: &DiagnosticCase,
        provider: Option<&str>,
        options: DiagnoseOptions,
    ) -> Result<CanonicalResult, Error> {
        let name = provider.unwrap_or_else(|| self.registry.default_name());
        let selected = self.registry.select(name)?;
        match selected.diagnose(case, &options).await {
            Ok(result) => {
                debug!(provider = name, "diagnosis completed");
                Ok(result)
            }
            Err(error) => {
                warn!(provider = name, error = %error, "diagnosis failed");
                Err(Error::from(error))
            }
        }
    }
}
