use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        extractors::AuthUser,
        services,
    },
    error::{AppError, JsonBody},
    state::AppState,
    users::dto::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let token = services::login(&state, &payload.email, payload.password).await?;
    Ok(Json(LoginResponse {
        message: "Login realizado com sucesso!".into(),
        token,
    }))
}

/// Current user, identified by the bearer token alone.
#[instrument(skip(state, claims))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state.users.find_by_id(claims.sub).await?;
    Ok(Json(user.into()))
}
