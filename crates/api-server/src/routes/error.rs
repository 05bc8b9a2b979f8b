//! Error responses shared by the route handlers

use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use tb_core::Error;

use crate::auth::{self, AuthError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retriable: bool,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

pub fn route_error(status: StatusCode, error: impl Into<String>) -> RouteError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            task_ids: Vec::new(),
            retriable: false,
        }),
    )
}

pub fn unauthorized(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::UNAUTHORIZED, error)
}

pub fn bad_request(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::BAD_REQUEST, error)
}

pub fn not_found(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::NOT_FOUND, error)
}

pub fn too_many_requests(retry_after: std::time::Duration) -> RouteError {
    route_error(
        StatusCode::TOO_MANY_REQUESTS,
        format!(
            "Too many bulk requests, retry in {} seconds",
            retry_after.as_secs().max(1)
        ),
    )
}

pub fn map_core_error(err: Error) -> RouteError {
    let status = match &err {
        Error::OwnershipViolation(_) => StatusCode::FORBIDDEN,
        Error::InvalidRestoreTarget(_) => StatusCode::CONFLICT,
        Error::SnapshotTooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::TransientStoreFailure(_) | Error::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Serialization(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            task_ids: err.offending_ids().to_vec(),
            retriable: err.is_retriable(),
        }),
    )
}

pub fn map_auth_error(err: AuthError) -> RouteError {
    match err {
        AuthError::Unauthorized(message) => unauthorized(message),
    }
}

/// The authenticated caller, or 401.
pub fn current_user(state: &AppState, headers: &HeaderMap) -> Result<Uuid, RouteError> {
    auth::current_user(state.jwt_keys(), headers).map_err(map_auth_error)
}
