//! Behavioural tests for batch dispatch through the diagnosis service.

use std::cell::RefCell;
use std::sync::Arc;

use ddx_gateway::domain::ports::DiagnosisProviderError;
use ddx_gateway::domain::{
    BatchItem, BatchReport, BatchRequest, DiagnosisService, DiagnosticCase,
    ProviderRegistration, ProviderRegistry, RegistryConfig,
};
use ddx_gateway::outbound::{LOCAL_RULES, LocalRulesProvider};
use ddx_gateway::test_support::{FixedClock, ScriptedProvider};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use tokio::runtime::Runtime;

const MISSING_KEY: &str = "OPENAI_API_KEY is not set";

struct BatchWorld {
    runtime: Runtime,
    service: RefCell<Option<DiagnosisService>>,
    report: RefCell<Option<BatchReport>>,
}

impl BatchWorld {
    fn submit(&self, items: Vec<BatchItem>, provider: Option<&str>) {
        let service = self.service.borrow();
        let service = service.as_ref().expect("gateway should be configured");
        let report = self.runtime.block_on(service.diagnose_batch(BatchRequest {
            items,
            provider: provider.map(str::to_owned),
            model: None,
        }));
        self.report.replace(Some(report));
    }

    fn with_report<T>(&self, f: impl FnOnce(&BatchReport) -> T) -> T {
        let report = self.report.borrow();
        f(report.as_ref().expect("batch should have been submitted"))
    }
}

#[fixture]
fn world() -> BatchWorld {
    BatchWorld {
        runtime: Runtime::new().expect("tokio runtime should initialize"),
        service: RefCell::new(None),
        report: RefCell::new(None),
    }
}

fn case(index: usize) -> BatchItem {
    let input = DiagnosticCase::new(format!("runny nose, day {index}")).expect("valid case");
    BatchItem {
        meta: Some(json!({ "row": index })),
        ..BatchItem::new(Ok(input))
    }
}

#[given("a gateway with local_rules and openai enabled and isabel disabled")]
fn a_gateway_with_isabel_disabled(world: &BatchWorld) {
    let unconfigured = (0..8)
        .map(|_| Err(DiagnosisProviderError::configuration(MISSING_KEY)))
        .collect();
    let registry = ProviderRegistry::new(
        vec![
            ProviderRegistration::new(
                LOCAL_RULES,
                Arc::new(LocalRulesProvider::new(Arc::new(FixedClock::epoch()))),
            ),
            ProviderRegistration::new("isabel", Arc::new(ScriptedProvider::succeeding("isabel"))),
            ProviderRegistration::new(
                "openai",
                Arc::new(ScriptedProvider::scripted("openai", unconfigured)),
            ),
        ],
        RegistryConfig {
            enabled: vec![LOCAL_RULES.to_owned(), "openai".to_owned()],
            default: LOCAL_RULES.to_owned(),
        },
    )
    .expect("registry should build");
    world
        .service
        .replace(Some(DiagnosisService::new(Arc::new(registry), 2)));
}

#[when("{count} cases are submitted with item {index} routed to isabel")]
fn cases_with_one_routed_to_isabel(world: &BatchWorld, count: usize, index: usize) {
    let items = (0..count)
        .map(|position| {
            let item = case(position);
            if position == index {
                item.with_provider("isabel")
            } else {
                item
            }
        })
        .collect();
    world.submit(items, None);
}

#[when("{count} cases are submitted to openai")]
fn cases_submitted_to_openai(world: &BatchWorld, count: usize) {
    world.submit((0..count).map(case).collect(), Some("openai"));
}

#[then("the summary reports {total} total, {ok} ok and {failed} failed")]
fn the_summary_reports(world: &BatchWorld, total: usize, ok: usize, failed: usize) {
    world.with_report(|report| {
        assert_eq!(report.summary.total, total);
        assert_eq!(report.summary.ok, ok);
        assert_eq!(report.summary.failed, failed);
        assert_eq!(report.results.len(), total);
    });
}

#[then("item {index} failed with {code}")]
fn item_failed_with(world: &BatchWorld, index: usize, code: String) {
    world.with_report(|report| {
        let result = &report.results[index];
        assert!(!result.ok, "item {index} should fail");
        assert_eq!(result.error.as_deref(), Some(code.as_str()));
        assert_eq!(result.meta, Some(json!({ "row": index })));
    });
}

#[then("the remaining items succeeded in submission order")]
fn remaining_items_succeeded(world: &BatchWorld) {
    world.with_report(|report| {
        for (position, result) in report.results.iter().enumerate() {
            assert_eq!(result.index, position);
            if result.ok {
                let output = result.output.as_ref().expect("successful items carry output");
                assert_eq!(output.engine.name, LOCAL_RULES);
            }
        }
    });
}

#[then("every item failed with {code}")]
fn every_item_failed_with(world: &BatchWorld, code: String) {
    world.with_report(|report| {
        for result in &report.results {
            assert_eq!(result.error.as_deref(), Some(code.as_str()));
            assert_eq!(
                result.detail.as_deref(),
                Some(format!("provider not configured: {MISSING_KEY}").as_str())
            );
        }
    });
}

#[scenario(
    path = "tests/features/batch_dispatch.feature",
    name = "A disabled provider fails only its own item"
)]
fn a_disabled_provider_fails_only_its_own_item(world: BatchWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/batch_dispatch.feature",
    name = "Missing credentials fail each routed item"
)]
fn missing_credentials_fail_each_routed_item(world: BatchWorld) {
    let _ = world;
}
