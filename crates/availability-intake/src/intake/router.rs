use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::IntakeError;
use super::gateway::AvailabilityGateway;
use super::repository::{SessionId, SessionStore, StoreError};
use super::service::{IntakeServiceError, IntakeSessionService};
use super::widget::WidgetOptions;

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ApartmentRequest {
    pub is_apartment: bool,
}

#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    pub value: String,
}

type SharedService<S, G> = State<Arc<IntakeSessionService<S, G>>>;

/// Router builder exposing the widget session endpoints.
pub fn intake_router<S, G>(service: Arc<IntakeSessionService<S, G>>) -> Router
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    Router::new()
        .route("/api/v1/intake/sessions", post(create_handler::<S, G>))
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(get_handler::<S, G>).delete(close_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/address",
            put(address_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/location",
            post(location_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/apartment",
            put(apartment_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/check",
            post(check_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/identity-number",
            put(identity_number_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/identity-number/finalize",
            post(finalize_identity_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/phone-number",
            put(phone_number_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/reset",
            post(reset_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/toggle",
            post(toggle_handler::<S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/continue",
            post(continue_handler::<S, G>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S, G>(
    State(service): SharedService<S, G>,
    axum::Json(options): axum::Json<WidgetOptions>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    match service.create(options) {
        Ok(snapshot) => (StatusCode::CREATED, axum::Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.get(&SessionId(session_id)))
}

pub(crate) async fn close_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    match service.close(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn address_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AddressRequest>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.edit_address(&SessionId(session_id), request.address))
}

pub(crate) async fn location_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.use_location(&SessionId(session_id)))
}

pub(crate) async fn apartment_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<ApartmentRequest>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.set_apartment(&SessionId(session_id), request.is_apartment))
}

pub(crate) async fn check_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    match service.start_check(&SessionId(session_id)) {
        Ok(pending) => (StatusCode::ACCEPTED, axum::Json(pending.snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn identity_number_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<FieldRequest>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.edit_identity_number(&SessionId(session_id), &request.value))
}

pub(crate) async fn finalize_identity_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.finalize_identity_number(&SessionId(session_id)))
}

pub(crate) async fn phone_number_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<FieldRequest>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.edit_phone_number(&SessionId(session_id), &request.value))
}

pub(crate) async fn reset_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.reset(&SessionId(session_id)))
}

pub(crate) async fn toggle_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    snapshot_response(service.toggle(&SessionId(session_id)))
}

pub(crate) async fn continue_handler<S, G>(
    State(service): SharedService<S, G>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    match service.continue_with(&SessionId(session_id)) {
        Ok(submission) => (StatusCode::OK, axum::Json(submission)).into_response(),
        Err(err) => error_response(err),
    }
}

fn snapshot_response<T: serde::Serialize>(result: Result<T, IntakeServiceError>) -> Response {
    match result {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: IntakeServiceError) -> Response {
    let status = match &err {
        IntakeServiceError::Intake(
            IntakeError::InvalidTransition { .. } | IntakeError::StaleTicket { .. },
        ) => StatusCode::CONFLICT,
        IntakeServiceError::Intake(
            IntakeError::AddressNotPlausible | IntakeError::ContinueDisabled,
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        IntakeServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        IntakeServiceError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
