use axum::Json;
use axum::extract::{Query, State};
use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tollgate_forward::{ForwardResponse, ForwardToken};

use crate::extract::{JsonBody, RequireAuth};
use crate::{ApiError, AppState};

/// Header carrying the connection secret on proxied requests
const CONNECTION_SECRET_HEADER: &str = "x-connection-secret";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardTokenRequest {
    #[serde(default)]
    connection_secret: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardTokenResponse {
    forward_token: ForwardToken,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForwardQuery {
    #[serde(default)]
    u: Option<String>,
}

/// POST `/api/create-forward-token`
pub async fn create_forward_token(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    JsonBody(body): JsonBody<ForwardTokenRequest>,
) -> Result<Json<ForwardTokenResponse>, ApiError> {
    let forward_token = state.gateway.issuer().issue_raw(body.connection_secret.as_deref())?;
    tracing::debug!(user_id = %auth.user.id, "forward token issued");

    Ok(Json(ForwardTokenResponse { forward_token }))
}

/// POST `/api/forward?u=<target>`
pub async fn forward(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ForwardQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ForwardResponse, ApiError> {
    let connection_secret = headers
        .get(CONNECTION_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    let response = state
        .gateway
        .forward(&auth, connection_secret, query.u.as_deref(), body)
        .await?;

    Ok(response)
}
