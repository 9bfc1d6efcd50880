//! Tests for the diagnosis HTTP handlers.

use super::*;
use crate::Trace;
use crate::inbound::http::error::json_error_handler;
use crate::inbound::http::test_utils::http_state;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    allow_phi: bool,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(http_state(allow_phi)))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .service(diagnose)
        .service(diagnose_batch)
}

async fn post(
    allow_phi: bool,
    uri: &str,
    headers: &[(&str, &str)],
    body: Value,
) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(allow_phi)).await;
    let mut request = actix_test::TestRequest::post().uri(uri).set_json(body);
    for (name, value) in headers {
        request = request.insert_header((*name, *value));
    }
    let res = actix_test::call_service(&app, request.to_request()).await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

fn chest_pain() -> Value {
    json!({ "chief_complaint": "fever, cough, pleuritic chest pain" })
}

#[actix_web::test]
async fn diagnoses_with_default_provider() {
    let (status, body) = post(
        false,
        "/ai/diagnose",
        &[],
        json!({ "deidentified": true, "input": chest_pain() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"], json!({ "name": "local_rules", "version": "0.1" }));
    assert_eq!(body["triage"]["level"], "high");
    assert_eq!(body["differential"][0]["condition"], "Unstable angina");
    assert_eq!(body["recommended_tests"], json!(["ECG", "Troponin"]));
    assert_eq!(body["provenance"]["generated_at"], "2026-01-01T00:00:00Z");
}

#[rstest]
#[case::missing_flag(json!({ "input": { "chief_complaint": "cough" } }))]
#[case::false_flag(json!({ "deidentified": false, "input": { "chief_complaint": "cough" } }))]
#[case::checked_before_input(json!({ "deidentified": false }))]
#[actix_rt::test]
async fn rejects_phi_unless_allowed(#[case] body: Value) {
    let (status, body) = post(false, "/ai/diagnose", &[], body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "phi_not_allowed");
    assert!(body["trace_id"].is_string());
}

#[actix_web::test]
async fn allow_phi_lifts_the_gate() {
    let (status, _) = post(
        true,
        "/ai/diagnose",
        &[],
        json!({ "input": { "chief_complaint": "runny nose" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[case::missing_input(json!({ "deidentified": true }))]
#[case::missing_complaint(json!({ "deidentified": true, "input": { "notes": "x" } }))]
#[case::blank_complaint(json!({ "deidentified": true, "input": { "chief_complaint": "  " } }))]
#[case::wrong_shape(json!({ "deidentified": true, "input": "chest pain" }))]
#[actix_rt::test]
async fn invalid_input_is_a_bad_request(#[case] body: Value) {
    let (status, body) = post(false, "/ai/diagnose", &[], body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let app = actix_test::init_service(test_app(false)).await;
    let req = actix_test::TestRequest::post()
        .uri("/ai/diagnose")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();

    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "bad_request");
}

#[rstest]
#[case::query_beats_header("/ai/diagnose?provider=local_rules", &[(PROVIDER_HEADER, "isabel")], None, StatusCode::OK, None)]
#[case::header_beats_body("/ai/diagnose", &[(PROVIDER_HEADER, "isabel")], Some("local_rules"), StatusCode::BAD_REQUEST, Some("provider_disabled"))]
#[case::body_used_last("/ai/diagnose", &[], Some("watson"), StatusCode::BAD_REQUEST, Some("unknown_provider"))]
#[case::blank_query_ignored("/ai/diagnose?provider=", &[], Some("isabel"), StatusCode::BAD_REQUEST, Some("provider_disabled"))]
#[actix_rt::test]
async fn provider_precedence(
    #[case] uri: &str,
    #[case] headers: &[(&str, &str)],
    #[case] body_provider: Option<&str>,
    #[case] expected_status: StatusCode,
    #[case] expected_code: Option<&str>,
) {
    let (status, body) = post(
        false,
        uri,
        headers,
        json!({ "deidentified": true, "input": chest_pain(), "provider": body_provider }),
    )
    .await;

    assert_eq!(status, expected_status);
    if let Some(code) = expected_code {
        assert_eq!(body["code"], code);
    }
}

#[actix_web::test]
async fn unconfigured_provider_is_unavailable() {
    let (status, body) = post(
        false,
        "/ai/diagnose?provider=openai",
        &[],
        json!({ "deidentified": true, "input": chest_pain() }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "configuration_error");
    assert_eq!(
        body["message"],
        "provider not configured: OPENAI_API_KEY is not set"
    );
}

#[actix_web::test]
async fn batch_isolates_item_failures() {
    let items: Vec<Value> = (0..5)
        .map(|index| {
            let mut item = json!({
                "input": { "chief_complaint": format!("case {index}") },
                "meta": { "row": index }
            });
            if index == 2 {
                item["provider"] = json!("isabel");
            }
            item
        })
        .collect();

    let (status, body) = post(
        false,
        "/ai/diagnose/batch",
        &[],
        json!({ "deidentified": true, "items": items }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], json!({ "total": 5, "ok": 4, "failed": 1 }));
    assert_eq!(body["results"][2]["index"], 2);
    assert_eq!(body["results"][2]["ok"], false);
    assert_eq!(body["results"][2]["error"], "provider_disabled");
    assert_eq!(body["results"][2]["meta"], json!({ "row": 2 }));
    assert_eq!(body["results"][4]["output"]["engine"]["name"], "local_rules");
}

#[actix_web::test]
async fn batch_reports_invalid_items_by_index() {
    let (status, body) = post(
        false,
        "/ai/diagnose/batch",
        &[],
        json!({
            "deidentified": true,
            "items": [
                { "input": { "chief_complaint": "cough" } },
                { "input": { "chief_complaint": "" } },
                "not an object",
                { "meta": "no input" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], json!({ "total": 4, "ok": 1, "failed": 3 }));
    for index in 1..4 {
        assert_eq!(body["results"][index]["error"], "bad_request");
    }
    assert_eq!(body["results"][3]["meta"], "no input");
}

#[actix_web::test]
async fn batch_header_provider_applies_to_items() {
    let (status, body) = post(
        false,
        "/ai/diagnose/batch",
        &[(PROVIDER_HEADER, "isabel")],
        json!({
            "deidentified": true,
            "items": [
                { "input": { "chief_complaint": "cough" } },
                { "input": { "chief_complaint": "cough" }, "provider": "local_rules" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["error"], "provider_disabled");
    assert_eq!(body["results"][1]["ok"], true);
}

#[rstest]
#[case::phi(json!({ "items": [] }), "phi_not_allowed")]
#[case::items_not_a_list(json!({ "deidentified": true, "items": { "input": {} } }), "bad_request")]
#[actix_rt::test]
async fn batch_terminal_errors(#[case] body: Value, #[case] code: &str) {
    let (status, body) = post(false, "/ai/diagnose/batch", &[], body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], code);
}
