//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: the diagnosis, provider catalogue and health endpoints
//! - **Schemas**: domain type wrappers from [`crate::inbound::http::schemas`]
//!   that provide OpenAPI definitions without coupling domain types to the
//!   utoipa framework
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::diagnose::{BatchItemRequest, DiagnoseBatchRequest, DiagnoseRequest};
use crate::inbound::http::health::HealthSummary;
use crate::inbound::http::providers::ProvidersResponse;
use crate::inbound::http::schemas::{
    BatchReportSchema, BatchResultSchema, BatchSummarySchema, CanonicalResultSchema,
    DemographicsSchema, DiagnosticCaseSchema, DifferentialEntrySchema, EngineSchema,
    ErrorCodeSchema, ErrorSchema, ProvenanceSchema, TriageLevelSchema, TriageSchema,
};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Diagnostic reasoning gateway API",
        description = "Routes de-identified clinical cases to diagnosis providers and returns a canonical differential."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::diagnose::diagnose,
        crate::inbound::http::diagnose::diagnose_batch,
        crate::inbound::http::providers::list_providers,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        DiagnoseRequest,
        DiagnoseBatchRequest,
        BatchItemRequest,
        ProvidersResponse,
        HealthSummary,
        ErrorSchema,
        ErrorCodeSchema,
        DiagnosticCaseSchema,
        DemographicsSchema,
        CanonicalResultSchema,
        EngineSchema,
        DifferentialEntrySchema,
        TriageSchema,
        TriageLevelSchema,
        ProvenanceSchema,
        BatchReportSchema,
        BatchResultSchema,
        BatchSummarySchema
    )),
    tags(
        (name = "diagnosis", description = "Single and batch case diagnosis"),
        (name = "providers", description = "Provider discovery"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema field structure.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";
    const CASE_SCHEMA_NAME: &str = "crate.domain.DiagnosticCase";
    const RESULT_SCHEMA_NAME: &str = "crate.domain.CanonicalResult";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case(ERROR_SCHEMA_NAME, &["code", "message", "trace_id"])]
    #[case(CASE_SCHEMA_NAME, &["chief_complaint", "demographics", "symptoms"])]
    #[case(RESULT_SCHEMA_NAME, &["engine", "differential", "triage", "provenance"])]
    fn registered_schemas_have_fields(#[case] name: &str, #[case] fields: &[&str]) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");

        for field in fields {
            assert_object_schema_has_field(schema, field);
        }
    }

    #[rstest]
    #[case("/ai/diagnose")]
    #[case("/ai/diagnose/batch")]
    #[case("/ai/providers")]
    #[case("/health")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn documents_every_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn diagnose_references_error_schema() {
        let json = ApiDoc::openapi().to_json().expect("valid JSON");
        assert!(json.contains(&format!("#/components/schemas/{ERROR_SCHEMA_NAME}")));
    }
}
