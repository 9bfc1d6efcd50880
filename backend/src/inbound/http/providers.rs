//! Provider discovery endpoint.

use actix_web::{HttpResponse, get, web};
use serde::Serialize;

use super::state::HttpState;

/// Body of `GET /ai/providers`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProvidersResponse {
    #[schema(example = "local_rules")]
    pub default: String,
    /// Enabled providers in registration order.
    #[schema(example = json!(["local_rules", "isabel"]))]
    pub enabled: Vec<String>,
}

/// List the default provider and every enabled provider.
#[utoipa::path(
    get,
    path = "/ai/providers",
    tags = ["providers"],
    responses((status = 200, description = "Provider catalogue", body = ProvidersResponse))
)]
#[get("/ai/providers")]
pub async fn list_providers(state: web::Data<HttpState>) -> HttpResponse {
    let registry = state.service.registry();
    HttpResponse::Ok().json(ProvidersResponse {
        default: registry.default_name().to_owned(),
        enabled: registry
            .list_enabled()
            .into_iter()
            .map(str::to_owned)
            .collect(),
    })
}
