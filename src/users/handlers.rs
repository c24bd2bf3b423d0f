use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::{AppError, JsonBody},
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
        services::{self, parse_user_id},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(list_users).post(create_user))
        .route("/usuarios/:id", get(get_user).put(update_user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = services::register(&state, payload).await?;
    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = services::list(&state).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, AppError> {
    let id = parse_user_id(&id)?;
    let user = services::get(&state, id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let id = parse_user_id(&id)?;
    let password_changed = payload.password.as_deref().is_some_and(|p| !p.is_empty());
    let user = services::update(&state, id, payload).await?;
    info!(user_id = %user.id, password_changed, "user updated");
    Ok(Json(user.into()))
}
