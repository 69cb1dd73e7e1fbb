//! User API endpoints

use api_types::user::{User, UserNew};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use engine::NewUserCmd;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn user_view(user: engine::User) -> User {
    User {
        id: user.id,
        email: user.email,
        name: user.name,
        mobile_number: user.mobile_number,
    }
}

/// Handle requests for creating a new user
pub async fn user_new(
    State(state): State<ServerState>,
    payload: Result<Json<UserNew>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let Json(payload) = payload?;
    let user = state
        .engine
        .new_user(NewUserCmd::new(
            payload.email,
            payload.name,
            payload.mobile_number,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, ServerError> {
    let Path(id) = id?;
    let user = state.engine.user(id).await?;
    Ok(Json(user_view(user)))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine.users().await?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}
