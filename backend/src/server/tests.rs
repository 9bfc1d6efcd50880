//! Tests for server wiring and readiness signalling.

use super::*;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use ddx_gateway::settings::{GatewaySettings, ProviderSettings};
use mockable::{DefaultClock, MockEnv};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

#[fixture]
fn http_state() -> HttpState {
    let mut env = MockEnv::new();
    env.expect_string().times(0..).returning(|_| None);
    let providers = ProviderSettings::from_env(&env).expect("vendor settings");
    let service = build_service(
        &GatewaySettings::default(),
        &providers,
        Arc::new(DefaultClock),
    )
    .expect("service builds");
    HttpState::new(service, false)
}

fn deps(health_state: web::Data<HealthState>, http_state: HttpState) -> AppDependencies {
    AppDependencies {
        health_state,
        http_state: web::Data::new(http_state),
    }
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(health_state: web::Data<HealthState>, http_state: HttpState) {
    assert!(!health_state.is_ready(), "state should start unready");

    let config = ServerConfig::new(("127.0.0.1".into(), 0), http_state);
    let _server = create_server(health_state.clone(), config).expect("server should build");

    assert!(
        health_state.is_ready(),
        "server creation should mark readiness"
    );
}

#[rstest]
#[actix_rt::test]
async fn app_lists_every_registered_provider(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
) {
    let app = actix_test::init_service(build_app(deps(health_state, http_state))).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/ai/providers").to_request(),
    )
    .await;

    assert!(res.headers().contains_key("trace-id"));
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({
            "default": "local_rules",
            "enabled": ["local_rules", "isabel", "infermedica", "openai"]
        })
    );
}

#[rstest]
#[actix_rt::test]
async fn app_diagnoses_with_local_rules(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
) {
    let app = actix_test::init_service(build_app(deps(health_state, http_state))).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/ai/diagnose")
            .set_json(json!({
                "deidentified": true,
                "input": { "chief_complaint": "chest pressure and diaphoresis" }
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["triage"]["level"], "high");
}

#[rstest]
#[actix_rt::test]
async fn malformed_body_uses_error_envelope(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
) {
    let app = actix_test::init_service(build_app(deps(health_state, http_state))).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/ai/diagnose/batch")
            .insert_header(("content-type", "application/json"))
            .set_payload("[")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let trace_id = res
        .headers()
        .get("trace-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace-id header");
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "bad_request");
    assert_eq!(body["trace_id"], trace_id.as_str());
}

#[rstest]
#[case("/health/ready", StatusCode::SERVICE_UNAVAILABLE)]
#[case("/health/live", StatusCode::OK)]
#[case("/health", StatusCode::OK)]
#[actix_rt::test]
async fn health_checks_are_routed(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    #[case] uri: &str,
    #[case] expected: StatusCode,
) {
    let app = actix_test::init_service(build_app(deps(health_state, http_state))).await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
        .await;

    assert_eq!(res.status(), expected);
}
