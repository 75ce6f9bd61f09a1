//! HTTP route handlers.
//!
//! Thin adapters: deserialize, call the engine, map the typed error to a
//! status code. No business logic lives here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use serde::Deserialize;

use convene_core::{ConventionStatus, Credential, DomainError};
use convene_engine::{
    ConventionEdit, EditInput, EngineError, SignInput, TransferInput, UpdateStatusInput,
};
use convene_links::LinkError;
use convene_storage::{ConventionRepository, StorageError};

use super::state::AppState;

/// Construct a JSON error response with the given status code and message.
pub(crate) fn json_error(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// Map a typed engine error to an HTTP response.
fn engine_error_response(err: EngineError) -> axum::response::Response {
    let status = match &err {
        EngineError::Domain(domain) => match domain {
            DomainError::ConventionNotFound { .. }
            | DomainError::AgencyNotFound { .. }
            | DomainError::UserNotFound { .. }
            | DomainError::MissingActor { .. } => StatusCode::NOT_FOUND,
            DomainError::ForbiddenMissingRights { .. }
            | DomainError::NoRightsOnAgency { .. }
            | DomainError::RoleNotAllowedForTransition { .. }
            | DomainError::RoleNotAllowedToSign { .. }
            | DomainError::TransferNotAllowedForDelegatingAgency { .. } => StatusCode::FORBIDDEN,
            DomainError::InvalidStatusTransition { .. }
            | DomainError::CancellationBlockedByAssessment { .. }
            | DomainError::TransitionGuardRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::InvalidMobilePhoneNumber { .. }
            | DomainError::MissingJustification { .. } => StatusCode::BAD_REQUEST,
            DomainError::SignatoryAlreadySigned { .. } => StatusCode::CONFLICT,
        },
        EngineError::Storage(storage) => match storage {
            StorageError::ConcurrentConflict { .. } | StorageError::ShortLinkExists { .. } => {
                StatusCode::CONFLICT
            }
            StorageError::ShortLinkConsumed { .. } => StatusCode::GONE,
            StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        EngineError::Link(link) => match link {
            LinkError::InvalidToken | LinkError::Expired { .. } => StatusCode::FORBIDDEN,
            LinkError::ShortIdExhausted | LinkError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        EngineError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
    };
    json_error(status, &err.to_string())
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// GET /conventions/{id}
pub(crate) async fn handle_get_convention(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match state.engine.store().get_by_id(&id).await {
        Ok(Some(convention)) => (StatusCode::OK, Json(convention)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, &format!("convention '{id}' not found")),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignBody {
    credential: Credential,
}

/// POST /conventions/{id}/sign
pub(crate) async fn handle_sign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SignBody>,
) -> axum::response::Response {
    let input = SignInput { convention_id: id };
    match state.engine.sign(input, &body.credential).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    target: ConventionStatus,
    #[serde(default)]
    justification: Option<String>,
    credential: Credential,
}

/// POST /conventions/{id}/status
pub(crate) async fn handle_update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> axum::response::Response {
    let input = UpdateStatusInput {
        convention_id: id,
        target: body.target,
        justification: body.justification,
    };
    match state.engine.update_status(input, &body.credential).await {
        Ok(id) => (StatusCode::OK, Json(serde_json::json!({"id": id}))).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditBody {
    #[serde(with = "time::serde::rfc3339")]
    expected_updated_at: time::OffsetDateTime,
    edit: ConventionEdit,
    credential: Credential,
}

/// POST /conventions/{id}/edit
pub(crate) async fn handle_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<EditBody>,
) -> axum::response::Response {
    let input = EditInput {
        convention_id: id,
        expected_updated_at: body.expected_updated_at,
        edit: body.edit,
    };
    match state.engine.edit(input, &body.credential).await {
        Ok(id) => (StatusCode::OK, Json(serde_json::json!({"id": id}))).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransferBody {
    target_agency_id: String,
    credential: Credential,
}

/// POST /conventions/{id}/transfer
pub(crate) async fn handle_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TransferBody>,
) -> axum::response::Response {
    let input = TransferInput {
        convention_id: id,
        target_agency_id: body.target_agency_id,
    };
    match state
        .engine
        .transfer_to_agency(input, &body.credential)
        .await
    {
        Ok(id) => (StatusCode::OK, Json(serde_json::json!({"id": id}))).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FanOutBody {
    credential: Credential,
    #[serde(default)]
    cooldown_hours: Option<i64>,
}

/// POST /conventions/{id}/signature-links
pub(crate) async fn handle_signature_links(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<FanOutBody>,
) -> axum::response::Response {
    match state
        .engine
        .send_signature_links(&id, &body.credential)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// POST /conventions/{id}/reminders
pub(crate) async fn handle_reminders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<FanOutBody>,
) -> axum::response::Response {
    let cooldown = body.cooldown_hours.unwrap_or(24);
    match state
        .engine
        .send_signature_reminders(&id, &body.credential, cooldown)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthBody {
    token: String,
}

/// POST /auth/verify -- exchange a magic-link token for the credential
/// it grants. Front-ends call this once when a link is opened.
pub(crate) async fn handle_verify_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthBody>,
) -> axum::response::Response {
    match state.engine.authenticate(&body.token).await {
        Ok(credential) => (StatusCode::OK, Json(credential)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// GET /to/{short_id} -- short-link redirection.
pub(crate) async fn handle_short_link(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> axum::response::Response {
    match state.engine.short_links().resolve(&short_id).await {
        Ok(Some(long_url)) => Redirect::temporary(&long_url).into_response(),
        Ok(None) => json_error(
            StatusCode::NOT_FOUND,
            &format!("short link '{short_id}' not found"),
        ),
        Err(e) => engine_error_response(e.into()),
    }
}
