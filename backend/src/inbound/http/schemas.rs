//! OpenAPI schemas for domain types.
//!
//! Domain types stay free of utoipa derives; the wrappers here mirror their
//! wire shape and are registered under the domain names.

use utoipa::ToSchema;

/// Stable machine-readable error category.
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    #[schema(rename = "conflict")]
    Conflict,
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Error payload returned by every failing endpoint.
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ErrorSchema {
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    #[schema(example = "insufficient credits: have 10, need 40")]
    message: String,
    /// Correlates the failure with server logs.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Carries `code` (a stable reason such as `insufficient_funds`) and,
    /// for validation failures, the offending `field`.
    details: Option<serde_json::Value>,
}
