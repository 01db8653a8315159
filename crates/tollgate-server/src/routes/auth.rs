use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tollgate_identity::PublicUser;

use crate::extract::{JsonBody, RequireAuth};
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    token: String,
    user: PublicUser,
}

#[derive(Serialize)]
pub struct UserResponse {
    user: PublicUser,
}

/// POST `/api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (token, user) = state.accounts.signup(&body.email, &body.password, &body.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: user.to_public(),
        }),
    ))
}

/// POST `/api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (token, user) = state.accounts.login(&body.email, &body.password).await?;

    Ok(Json(SessionResponse {
        token,
        user: user.to_public(),
    }))
}

/// GET `/api/auth/me`
pub async fn me(RequireAuth(auth): RequireAuth) -> Json<UserResponse> {
    Json(UserResponse {
        user: auth.user.to_public(),
    })
}

/// POST `/api/auth/logout`
pub async fn logout(State(state): State<AppState>, RequireAuth(auth): RequireAuth) -> Json<serde_json::Value> {
    state.accounts.logout(&auth.token);
    Json(serde_json::json!({ "ok": true }))
}
