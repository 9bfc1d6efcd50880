//! Test utilities for the gateway crate.
//!
//! Shared doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled only for tests or with the `test-support` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{DiagnoseOptions, DiagnosisProvider, DiagnosisProviderError};
use crate::domain::{
    BackoffJitter, CanonicalResult, DiagnosticCase, Engine, Provenance, RetryRuntime,
    RetrySleeper, Triage, TriageLevel,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock frozen at 2026-01-01T00:00:00Z.
    pub fn epoch() -> Self {
        Self(fixed_instant())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Instant used by [`FixedClock::epoch`].
pub fn fixed_instant() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single() {
        Some(instant) => instant,
        None => panic!("fixed instant must be valid"),
    }
}

/// Sleeper recording each requested delay without waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

/// Jitter strategy returning the base delay unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _bound: Duration) -> Duration {
        base
    }
}

/// Jitter strategy always adding the full bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxJitter;

impl BackoffJitter for MaxJitter {
    fn jittered_delay(&self, base: Duration, bound: Duration) -> Duration {
        base + bound
    }
}

/// Runtime recording sleeps through `sleeper` with no jitter.
pub fn recording_runtime(sleeper: Arc<RecordingSleeper>) -> RetryRuntime {
    RetryRuntime {
        sleeper,
        jitter: Arc::new(NoJitter),
    }
}

/// Canned low-acuity result tagged with `engine`.
pub fn canned_result(engine: &str) -> CanonicalResult {
    CanonicalResult {
        engine: Engine::new(engine, "test"),
        differential: Vec::new(),
        triage: Triage::new(TriageLevel::Low, "canned"),
        recommended_tests: Vec::new(),
        red_flags: Vec::new(),
        provenance: Provenance::at(fixed_instant()),
    }
}

/// Provider replaying scripted outcomes, then succeeding with a canned result.
///
/// Tracks call count and the peak number of concurrent calls.
pub struct ScriptedProvider {
    name: String,
    scripted: Mutex<VecDeque<Result<CanonicalResult, DiagnosisProviderError>>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    seen_models: Mutex<Vec<Option<String>>>,
}

impl ScriptedProvider {
    /// Provider that always succeeds.
    pub fn succeeding(name: &str) -> Self {
        Self::scripted(name, Vec::new())
    }

    /// Provider replaying `scripted` in order before succeeding.
    pub fn scripted(
        name: &str,
        scripted: Vec<Result<CanonicalResult, DiagnosisProviderError>>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            scripted: Mutex::new(scripted.into()),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            seen_models: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn seen_models(&self) -> Vec<Option<String>> {
        lock(&self.seen_models).clone()
    }
}

#[async_trait]
impl DiagnosisProvider for ScriptedProvider {
    async fn diagnose(
        &self,
        _case: &DiagnosticCase,
        options: &DiagnoseOptions,
    ) -> Result<CanonicalResult, DiagnosisProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.seen_models).push(options.model.clone());
        let active_now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active_now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let next = lock(&self.scripted).pop_front();
        next.unwrap_or_else(|| Ok(canned_result(&self.name)))
    }
}
