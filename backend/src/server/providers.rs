//! Provider wiring from settings.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::Clock;
use tracing::info;

use ddx_gateway::domain::{
    DiagnosisService, ProviderRegistration, ProviderRegistry, RetryExecutor, RetryPolicy,
};
use ddx_gateway::outbound::{
    INFERMEDICA, ISABEL, InfermedicaProvider, IsabelProvider, LOCAL_RULES, LocalRulesProvider,
    OPENAI, OpenAiProvider,
};
use ddx_gateway::settings::{GatewaySettings, ProviderSettings};

/// Register every provider in a fixed order: local rules first, then the
/// network vendors sharing one retry policy.
///
/// # Errors
/// Fails when a vendor client cannot be built or the registry rejects the
/// configured default.
pub(crate) fn build_registry(
    settings: &GatewaySettings,
    providers: &ProviderSettings,
    clock: Arc<dyn Clock>,
) -> Result<ProviderRegistry> {
    let timeout = settings.upstream_timeout();
    let retry = RetryExecutor::new(RetryPolicy::default());

    let isabel = IsabelProvider::new(
        providers.isabel.mode(ISABEL, timeout, Vec::new())?,
        retry.clone(),
        clock.clone(),
    );
    let infermedica = InfermedicaProvider::new(
        providers.infermedica_mode(timeout)?,
        retry.clone(),
        clock.clone(),
    );
    let openai = OpenAiProvider::new(
        providers.openai.mode(OPENAI, timeout, Vec::new())?,
        providers.openai_model.clone(),
        retry,
        clock.clone(),
    );

    let registry = ProviderRegistry::new(
        vec![
            ProviderRegistration::new(LOCAL_RULES, Arc::new(LocalRulesProvider::new(clock))),
            ProviderRegistration::new(ISABEL, Arc::new(isabel)),
            ProviderRegistration::new(INFERMEDICA, Arc::new(infermedica)),
            ProviderRegistration::new(OPENAI, Arc::new(openai)),
        ],
        settings.registry_config(),
    )
    .wrap_err("invalid provider configuration")?;

    info!(
        default = registry.default_name(),
        enabled = ?registry.list_enabled(),
        "provider registry ready"
    );
    Ok(registry)
}

/// Build the diagnosis service over a freshly wired registry.
///
/// # Errors
/// Propagates failures from [`build_registry`].
pub(crate) fn build_service(
    settings: &GatewaySettings,
    providers: &ProviderSettings,
    clock: Arc<dyn Clock>,
) -> Result<DiagnosisService> {
    let registry = build_registry(settings, providers, clock)?;
    Ok(DiagnosisService::new(
        Arc::new(registry),
        settings.batch_concurrency(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddx_gateway::domain::ports::DiagnoseOptions;
    use ddx_gateway::domain::{DiagnosticCase, ErrorCode};
    use mockable::{DefaultClock, MockEnv};
    use rstest::rstest;

    fn provider_settings(vars: &'static [(&'static str, &'static str)]) -> ProviderSettings {
        let mut env = MockEnv::new();
        env.expect_string().times(0..).returning(move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        });
        ProviderSettings::from_env(&env).expect("vendor settings")
    }

    fn gateway_settings(default: Option<&str>, enabled: Option<&str>) -> GatewaySettings {
        GatewaySettings {
            default_provider: default.map(str::to_owned),
            providers_enabled: enabled.map(|names| names.split(',').map(str::to_owned).collect()),
            ..GatewaySettings::default()
        }
    }

    #[rstest]
    fn registers_all_providers_in_order() {
        let registry = build_registry(
            &gateway_settings(None, None),
            &provider_settings(&[]),
            Arc::new(DefaultClock),
        )
        .expect("registry builds");

        assert_eq!(
            registry.list_enabled(),
            vec![LOCAL_RULES, ISABEL, INFERMEDICA, OPENAI]
        );
        assert_eq!(registry.default_name(), LOCAL_RULES);
    }

    #[rstest]
    fn allow_list_restricts_enabled_providers() {
        let registry = build_registry(
            &gateway_settings(Some("isabel"), Some("isabel, local_rules")),
            &provider_settings(&[]),
            Arc::new(DefaultClock),
        )
        .expect("registry builds");

        assert_eq!(registry.list_enabled(), vec![LOCAL_RULES, ISABEL]);
        assert_eq!(registry.default_name(), ISABEL);
    }

    #[rstest]
    fn unregistered_default_is_rejected() {
        let result = build_registry(
            &gateway_settings(Some("watson"), None),
            &provider_settings(&[]),
            Arc::new(DefaultClock),
        );

        assert!(result.is_err());
    }

    #[rstest]
    #[case(ISABEL, "ISABEL_API_KEY is not set")]
    #[case(INFERMEDICA, "INFERMEDICA_APP_ID is not set")]
    #[case(OPENAI, "OPENAI_API_KEY is not set")]
    #[tokio::test]
    async fn vendors_without_credentials_report_configuration_errors(
        #[case] provider: &str,
        #[case] message: &str,
    ) {
        let service = build_service(
            &gateway_settings(None, None),
            &provider_settings(&[]),
            Arc::new(DefaultClock),
        )
        .expect("service builds");

        let error = service
            .diagnose(
                &DiagnosticCase::new("cough").expect("valid case"),
                Some(provider),
                DiagnoseOptions::default(),
            )
            .await
            .expect_err("unconfigured vendor fails");

        assert_eq!(error.code(), ErrorCode::ConfigurationError);
        assert_eq!(error.message(), format!("provider not configured: {message}"));
    }

    #[rstest]
    #[tokio::test]
    async fn mock_flag_serves_canned_output_without_credentials() {
        let service = build_service(
            &gateway_settings(None, None),
            &provider_settings(&[("OPENAI_MOCK", "1")]),
            Arc::new(DefaultClock),
        )
        .expect("service builds");

        let result = service
            .diagnose(
                &DiagnosticCase::new("cough").expect("valid case"),
                Some(OPENAI),
                DiagnoseOptions::default(),
            )
            .await
            .expect("mock output");

        assert_eq!(result.engine.name, "openai");
    }
}
