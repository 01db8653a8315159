use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tollgate_billing::{BillingSession, CycleCredits, credits, select_connection_id};

use crate::extract::{JsonBody, RequireAuth};
use super::ConnectionQuery;
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionRequest {
    #[serde(default)]
    plan: String,
    #[serde(default)]
    connection_id: String,
    #[serde(default)]
    wallet_id: Option<String>,
}

/// GET `/api/billing/session`
pub async fn get_session(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<BillingSession>, ApiError> {
    let session = state.billing.resolve(&auth.user).await?;
    Ok(Json(session))
}

/// POST `/api/billing/session`
pub async fn set_session(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    JsonBody(body): JsonBody<SetSessionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .billing
        .set(&auth.user, &body.plan, &body.connection_id, body.wallet_id)
        .await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// GET `/api/billing/cycle-credits`
pub async fn cycle_credits(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ConnectionQuery>,
) -> Result<Json<CycleCredits>, ApiError> {
    let connection_id = select_connection_id(query.connection_id.as_deref(), &auth.user)?;
    let summary = credits::cycle_credits(&state.registry, &connection_id).await?;

    Ok(Json(summary))
}
