//! Bounded-concurrency batch dispatch.
//!
//! `min(concurrency, items)` workers run as futures on the caller's task and
//! claim indices from a shared counter. The claim is a single `fetch_add`
//! before any suspension, so no index is processed twice or skipped. Results
//! are written back by index.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use super::DiagnosisService;
use crate::domain::ports::DiagnoseOptions;
use crate::domain::{CanonicalResult, DiagnosticCase, Error};

/// One case in a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Parsed case, or the validation failure to report for this item.
    pub input: Result<DiagnosticCase, Error>,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Opaque caller metadata echoed back unchanged.
    pub meta: Option<serde_json::Value>,
}

impl BatchItem {
    pub fn new(input: Result<DiagnosticCase, Error>) -> Self {
        Self {
            input,
            provider: None,
            model: None,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// A batch with request-level fallbacks.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub items: Vec<BatchItem>,
    /// Provider used by items that name none.
    pub provider: Option<String>,
    /// Model used by items that name none.
    pub model: Option<String>,
}

/// Outcome for one batch item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CanonicalResult>,
    /// Stable error code, e.g. `provider_disabled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl BatchResult {
    fn success(index: usize, output: CanonicalResult, meta: Option<serde_json::Value>) -> Self {
        Self {
            index,
            ok: true,
            output: Some(output),
            error: None,
            detail: None,
            meta,
        }
    }

    fn failure(index: usize, error: &Error, meta: Option<serde_json::Value>) -> Self {
        Self {
            index,
            ok: false,
            output: None,
            error: Some(error.code().as_str().to_owned()),
            detail: Some(error.message().to_owned()),
            meta,
        }
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
}

/// Batch response: summary plus one result per input item, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<BatchResult>,
}

impl DiagnosisService {
    /// Diagnose every item, isolating failures per item.
    ///
    /// Provider resolution per item: item override, then the request-level
    /// provider, then the registry default.
    pub async fn diagnose_batch(&self, request: BatchRequest) -> BatchReport {
        let BatchRequest {
            items,
            provider,
            model,
        } = request;
        let total = items.len();
        let next = AtomicUsize::new(0);
        let workers = self.concurrency.min(total);

        let fallback = Fallback {
            provider: provider.as_deref(),
            model: model.as_deref(),
        };
        let finished = join_all(
            (0..workers).map(|_| self.run_worker(&items, &next, fallback)),
        )
        .await;

        let mut slots: Vec<Option<BatchResult>> = (0..total).map(|_| None).collect();
        for (index, result) in finished.into_iter().flatten() {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(result);
            }
        }
        let results: Vec<BatchResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let meta = items.get(index).and_then(|item| item.meta.clone());
                    BatchResult::failure(index, &Error::internal("batch item was not processed"), meta)
                })
            })
            .collect();

        let ok = results.iter().filter(|result| result.ok).count();
        BatchReport {
            summary: BatchSummary {
                total,
                ok,
                failed: total - ok,
            },
            results,
        }
    }

    async fn run_worker(
        &self,
        items: &[BatchItem],
        next: &AtomicUsize,
        fallback: Fallback<'_>,
    ) -> Vec<(usize, BatchResult)> {
        let mut completed = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(item) = items.get(index) else {
                break;
            };
            let meta = item.meta.clone();
            let result = match self.run_item(item, fallback).await {
                Ok(output) => BatchResult::success(index, output, meta),
                Err(error) => {
                    warn!(index, code = %error.code(), error = %error, "batch item failed");
                    BatchResult::failure(index, &error, meta)
                }
            };
            debug!(index, ok = result.ok, "batch item processed");
            completed.push((index, result));
        }
        completed
    }

    async fn run_item(
        &self,
        item: &BatchItem,
        fallback: Fallback<'_>,
    ) -> Result<CanonicalResult, Error> {
        let name = item
            .provider
            .as_deref()
            .or(fallback.provider)
            .unwrap_or_else(|| self.registry.default_name());
        let provider = self.registry.select(name)?;
        let case = item.input.as_ref().map_err(Clone::clone)?;
        let options = DiagnoseOptions::with_model(
            item.model
                .as_deref()
                .or(fallback.model)
                .map(str::to_owned),
        );
        provider
            .diagnose(case, &options)
            .await
            .map_err(Error::from)
    }
}

#[derive(Debug, Clone, Copy)]
struct Fallback<'a> {
    provider: Option<&'a str>,
    model: Option<&'a str>,
}
