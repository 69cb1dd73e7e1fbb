use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::{EngineError, ValidationErrors};

use serde::Serialize;
pub use server::{ServerState, app, router, run_with_listener};

mod balance_sheet;
mod expenses;
mod server;
mod users;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request (bad JSON, bad path parameter).
    Generic(String),
    /// Failure that is not the client's fault; logged, never shown.
    Internal(String),
}

#[derive(Serialize)]
#[serde(untagged)]
enum ErrorDetail {
    Fields(ValidationErrors),
    Message(String),
}

#[derive(Serialize)]
struct ErrorBody {
    errors: ErrorDetail,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) | EngineError::UnsupportedSplitMethod(_) => {
            StatusCode::BAD_REQUEST
        }
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_) | EngineError::InvalidId(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn detail_for_engine_error(err: EngineError) -> ErrorDetail {
    match err {
        EngineError::Validation(errors) => ErrorDetail::Fields(errors),
        EngineError::UnsupportedSplitMethod(method) => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "split_method",
                format!("\"{method}\" is not a valid choice. Use equal, percentage or exact."),
            );
            ErrorDetail::Fields(errors)
        }
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorDetail::Message("internal server error".to_string())
        }
        other => ErrorDetail::Message(other.to_string()),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, errors) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), detail_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, ErrorDetail::Message(err)),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail::Message("internal server error".to_string()),
                )
            }
        };

        (status, Json(ErrorBody { errors })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Generic(value.body_text())
    }
}
