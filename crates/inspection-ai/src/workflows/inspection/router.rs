use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::domain::{Identity, Role, Trade};
use super::mapping::RegistryError;
use super::mapping::store::MappingStore;
use super::service::{InspectionService, InspectionServiceError};

/// Header carrying the user name resolved by the authentication gate.
pub const USER_HEADER: &str = "x-user-id";
/// Header carrying the caller's role (`admin` or `inspector`).
pub const ROLE_HEADER: &str = "x-user-role";

/// Router exposing evaluation and trade-mapping endpoints.
pub fn inspection_router<S>(service: Arc<InspectionService<S>>) -> Router
where
    S: MappingStore + 'static,
{
    Router::new()
        .route("/api/v1/inspections/evaluate", post(evaluate_handler::<S>))
        .route(
            "/api/v1/mappings",
            get(list_mappings_handler::<S>).put(upsert_mapping_handler::<S>),
        )
        .route("/api/v1/mappings/unmapped", post(unmapped_handler::<S>))
        .route(
            "/api/v1/mappings/:raw_label",
            delete(deactivate_mapping_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct UpsertMappingRequest {
    pub raw_label: String,
    pub canonical_trade: String,
}

pub(crate) async fn evaluate_handler<S>(
    State(service): State<Arc<InspectionService<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: MappingStore + 'static,
{
    let identity = match identity_from_headers(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let evaluated_at = Utc::now().naive_utc();
    match service.evaluate_csv(Cursor::new(body), evaluated_at) {
        Ok(evaluation) => {
            info!(
                user = %identity.user,
                properties = evaluation.summary.properties,
                "inspection evaluation served"
            );
            (StatusCode::OK, Json(evaluation)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_mappings_handler<S>(
    State(service): State<Arc<InspectionService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: MappingStore + 'static,
{
    if let Err(response) = identity_from_headers(&headers) {
        return response;
    }
    (StatusCode::OK, Json(service.mappings())).into_response()
}

pub(crate) async fn unmapped_handler<S>(
    State(service): State<Arc<InspectionService<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: MappingStore + 'static,
{
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    match service.unmapped_terms(Cursor::new(body)) {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "total_occurrences": report.total_occurrences(),
                "terms": report.terms(),
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upsert_mapping_handler<S>(
    State(service): State<Arc<InspectionService<S>>>,
    headers: HeaderMap,
    Json(request): Json<UpsertMappingRequest>,
) -> Response
where
    S: MappingStore + 'static,
{
    let identity = match require_admin(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let trade = match request.canonical_trade.parse::<Trade>() {
        Ok(trade) => trade,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    match service.upsert_mapping(&request.raw_label, trade) {
        Ok(outcome) => {
            info!(user = %identity.user, raw_label = %request.raw_label, ?outcome, "mapping edited");
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn deactivate_mapping_handler<S>(
    State(service): State<Arc<InspectionService<S>>>,
    headers: HeaderMap,
    Path(raw_label): Path<String>,
) -> Response
where
    S: MappingStore + 'static,
{
    let identity = match require_admin(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match service.deactivate_mapping(&raw_label) {
        Ok(()) => {
            info!(user = %identity.user, %raw_label, "mapping deactivated");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Read the identity the authentication gate attached to the request.
pub(crate) fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, Response> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let user = header(USER_HEADER);
    let role = header(ROLE_HEADER).and_then(Role::parse);
    match (user, role) {
        (Some(user), Some(role)) => Ok(Identity {
            user: user.to_string(),
            role,
        }),
        _ => {
            let payload = json!({ "error": "request is missing an authenticated identity" });
            Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
        }
    }
}

fn require_admin(headers: &HeaderMap) -> Result<Identity, Response> {
    let identity = identity_from_headers(headers)?;
    if identity.role.can_edit_mappings() {
        Ok(identity)
    } else {
        let payload = json!({ "error": "trade mappings can only be edited by an admin" });
        Err((StatusCode::FORBIDDEN, Json(payload)).into_response())
    }
}

fn error_response(error: InspectionServiceError) -> Response {
    let status = match &error {
        InspectionServiceError::Ingest(_) => StatusCode::BAD_REQUEST,
        InspectionServiceError::Registry(RegistryError::EmptyLabel) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        InspectionServiceError::Registry(RegistryError::UnknownLabel(_)) => StatusCode::NOT_FOUND,
        InspectionServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
