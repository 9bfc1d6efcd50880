//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::ports::DiagnosisProviderError;
use crate::domain::{
    DiagnosisService, ProviderRegistration, ProviderRegistry, RegistryConfig,
};
use crate::outbound::local_rules::{LOCAL_RULES, LocalRulesProvider};
use crate::test_support::{FixedClock, ScriptedProvider};

use super::state::HttpState;

/// Build HTTP state over three providers:
///
/// - `local_rules`: the real rules engine with a frozen clock (default)
/// - `isabel`: registered but not enabled
/// - `openai`: enabled, always failing with a missing-key configuration error
pub fn http_state(allow_phi: bool) -> HttpState {
    let failing = ScriptedProvider::scripted(
        "openai",
        vec![Err(DiagnosisProviderError::configuration(
            "OPENAI_API_KEY is not set",
        ))],
    );
    let registry = ProviderRegistry::new(
        vec![
            ProviderRegistration::new(
                LOCAL_RULES,
                Arc::new(LocalRulesProvider::new(Arc::new(FixedClock::epoch()))),
            ),
            ProviderRegistration::new("isabel", Arc::new(ScriptedProvider::succeeding("isabel"))),
            ProviderRegistration::new("openai", Arc::new(failing)),
        ],
        RegistryConfig {
            enabled: vec![LOCAL_RULES.to_owned(), "openai".to_owned()],
            default: LOCAL_RULES.to_owned(),
        },
    )
    .expect("test registry is valid");

    HttpState::new(DiagnosisService::new(Arc::new(registry), 2), allow_phi)
}
