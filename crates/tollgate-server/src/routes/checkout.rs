use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tollgate_billing::{
    CreditBundleCheckout, CreditBundles, ResolvedConnection, SubscriptionCheckout, credits, select_connection_id,
};

use crate::extract::{JsonBody, OptionalAuth, RequireAuth};
use super::ConnectionQuery;
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    plan: String,
    #[serde(default)]
    connection_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBundleSessionRequest {
    #[serde(default)]
    connection_id: Option<String>,
    #[serde(default)]
    credit_bundle_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConnectionRequest {
    #[serde(default)]
    connection_id: String,
}

/// POST `/api/checkout/create-session`
pub async fn create_session(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    JsonBody(body): JsonBody<CreateSessionRequest>,
) -> Result<Json<SubscriptionCheckout>, ApiError> {
    let session = state
        .checkout
        .create_subscription_session(&body.plan, body.connection_id.as_deref(), auth.is_some())
        .await?;

    Ok(Json(session))
}

/// GET `/api/checkout/credit-bundles`
pub async fn credit_bundles(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ConnectionQuery>,
) -> Result<Json<CreditBundles>, ApiError> {
    let connection_id = select_connection_id(query.connection_id.as_deref(), &auth.user)?;
    let bundles = credits::credit_bundles(&state.registry, &connection_id).await?;

    Ok(Json(bundles))
}

/// POST `/api/checkout/create-credit-bundle-session`
pub async fn create_credit_bundle_session(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    JsonBody(body): JsonBody<CreditBundleSessionRequest>,
) -> Result<Json<CreditBundleCheckout>, ApiError> {
    let connection_id = select_connection_id(body.connection_id.as_deref(), &auth.user)?;
    let session = state
        .checkout
        .create_credit_bundle_session(&connection_id, &body.credit_bundle_id)
        .await?;

    Ok(Json(session))
}

/// POST `/api/checkout/resolve-connection`
pub async fn resolve_connection(
    State(state): State<AppState>,
    RequireAuth(_auth): RequireAuth,
    JsonBody(body): JsonBody<ResolveConnectionRequest>,
) -> Result<Json<ResolvedConnection>, ApiError> {
    let resolved = state.checkout.resolve_connection(&body.connection_id).await?;
    Ok(Json(resolved))
}
