//! Diagnosis endpoints.
//!
//! ```text
//! POST /ai/diagnose {"deidentified":true,"input":{"chief_complaint":"chest pain"}}
//! POST /ai/diagnose/batch {"deidentified":true,"items":[{"input":{...},"meta":{...}}]}
//! ```
//!
//! The PHI gate runs before anything else is inspected. Provider precedence is
//! the `provider` query parameter, the `x-provider` header, the body field,
//! then the registry default; batch items may override per item.

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use super::state::HttpState;
use crate::domain::ports::DiagnoseOptions;
use crate::domain::{BatchItem, BatchRequest, DiagnosticCase, Error};

/// Header naming the provider for a request.
pub const PROVIDER_HEADER: &str = "x-provider";

/// Query parameters shared by both diagnosis endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProviderQuery {
    /// Provider override; wins over the header and the body.
    pub provider: Option<String>,
}

/// Body of `POST /ai/diagnose`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DiagnoseRequest {
    /// Caller attests the input carries no protected health information.
    #[serde(default)]
    pub deidentified: bool,
    #[schema(value_type = Option<crate::inbound::http::schemas::DiagnosticCaseSchema>)]
    pub input: Option<Value>,
    #[schema(example = "gpt-4o-mini")]
    pub model: Option<String>,
    #[schema(example = "local_rules")]
    pub provider: Option<String>,
}

/// One entry of a batch body.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BatchItemRequest {
    #[schema(value_type = Option<crate::inbound::http::schemas::DiagnosticCaseSchema>)]
    pub input: Option<Value>,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Opaque metadata echoed in the matching result.
    pub meta: Option<Value>,
}

/// Body of `POST /ai/diagnose/batch`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DiagnoseBatchRequest {
    #[serde(default)]
    pub deidentified: bool,
    /// Items are validated individually; a bad item fails only itself.
    #[serde(default)]
    #[schema(value_type = Vec<BatchItemRequest>)]
    pub items: Vec<Value>,
    pub model: Option<String>,
    pub provider: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Resolve the request-level provider by precedence.
fn requested_provider(
    query: &ProviderQuery,
    req: &HttpRequest,
    body: Option<&str>,
) -> Option<String> {
    let header = req
        .headers()
        .get(PROVIDER_HEADER)
        .and_then(|value| value.to_str().ok());
    non_blank(query.provider.as_deref())
        .or_else(|| non_blank(header))
        .or_else(|| non_blank(body))
        .map(str::to_owned)
}

fn ensure_phi_allowed(state: &HttpState, deidentified: bool) -> Result<(), Error> {
    if deidentified || state.allow_phi {
        Ok(())
    } else {
        Err(Error::phi_not_allowed(
            "request must declare deidentified: true",
        ))
    }
}

fn parse_case(input: Option<Value>) -> Result<DiagnosticCase, Error> {
    let input = input.ok_or_else(|| Error::bad_request("input is required"))?;
    serde_json::from_value(input).map_err(|error| Error::bad_request(format!("invalid input: {error}")))
}

fn parse_item(raw: Value) -> BatchItem {
    match serde_json::from_value::<BatchItemRequest>(raw) {
        Ok(item) => BatchItem {
            input: parse_case(item.input),
            provider: item.provider,
            model: item.model,
            meta: item.meta,
        },
        Err(error) => BatchItem::new(Err(Error::bad_request(format!("invalid item: {error}")))),
    }
}

/// Diagnose one case.
#[utoipa::path(
    post,
    path = "/ai/diagnose",
    tags = ["diagnosis"],
    params(
        ProviderQuery,
        ("x-provider" = Option<String>, Header, description = "Provider override")
    ),
    request_body = DiagnoseRequest,
    responses(
        (status = 200, description = "Canonical diagnosis", body = crate::inbound::http::schemas::CanonicalResultSchema),
        (status = 400, description = "Invalid request, PHI or provider", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 502, description = "Vendor failure", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 503, description = "Provider not configured", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 500, description = "Internal server error", body = crate::inbound::http::schemas::ErrorSchema)
    )
)]
#[post("/ai/diagnose")]
pub async fn diagnose(
    state: web::Data<HttpState>,
    query: web::Query<ProviderQuery>,
    req: HttpRequest,
    payload: web::Json<DiagnoseRequest>,
) -> ApiResult<HttpResponse> {
    let DiagnoseRequest {
        deidentified,
        input,
        model,
        provider,
    } = payload.into_inner();
    ensure_phi_allowed(&state, deidentified)?;

    let case = parse_case(input)?;
    let provider = requested_provider(&query, &req, provider.as_deref());
    debug!(provider = ?provider, "diagnose request");
    let result = state
        .service
        .diagnose(&case, provider.as_deref(), DiagnoseOptions::with_model(model))
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Diagnose a batch of cases with bounded concurrency.
#[utoipa::path(
    post,
    path = "/ai/diagnose/batch",
    tags = ["diagnosis"],
    params(
        ProviderQuery,
        ("x-provider" = Option<String>, Header, description = "Default provider for items")
    ),
    request_body = DiagnoseBatchRequest,
    responses(
        (status = 200, description = "Per-item outcomes", body = crate::inbound::http::schemas::BatchReportSchema),
        (status = 400, description = "Malformed body or PHI not allowed", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 500, description = "Internal server error", body = crate::inbound::http::schemas::ErrorSchema)
    )
)]
#[post("/ai/diagnose/batch")]
pub async fn diagnose_batch(
    state: web::Data<HttpState>,
    query: web::Query<ProviderQuery>,
    req: HttpRequest,
    payload: web::Json<DiagnoseBatchRequest>,
) -> ApiResult<HttpResponse> {
    let DiagnoseBatchRequest {
        deidentified,
        items,
        model,
        provider,
    } = payload.into_inner();
    ensure_phi_allowed(&state, deidentified)?;

    let request = BatchRequest {
        items: items.into_iter().map(parse_item).collect(),
        provider: requested_provider(&query, &req, provider.as_deref()),
        model,
    };
    let report = state.service.diagnose_batch(request).await;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
#[path = "diagnose_tests.rs"]
mod tests;
