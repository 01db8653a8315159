mod auth;
mod billing;
mod checkout;
mod forward;

use axum::Router;
use axum::routing::{get, post};
use serde::Deserialize;

use crate::AppState;

/// `?connectionId=` on routes that fall back to the cached billing connection
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionQuery {
    #[serde(default)]
    connection_id: Option<String>,
}

/// All `/api` routes, with session resolution applied
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/checkout/create-session", post(checkout::create_session))
        .route("/api/checkout/credit-bundles", get(checkout::credit_bundles))
        .route(
            "/api/checkout/create-credit-bundle-session",
            post(checkout::create_credit_bundle_session),
        )
        .route("/api/checkout/resolve-connection", post(checkout::resolve_connection))
        .route("/api/billing/session", get(billing::get_session).post(billing::set_session))
        .route("/api/billing/cycle-credits", get(billing::cycle_credits))
        .route("/api/create-forward-token", post(forward::create_forward_token))
        .route("/api/forward", post(forward::forward))
        .layer(axum::middleware::from_fn_with_state(
            state.accounts.clone(),
            crate::auth::session_middleware,
        ))
        .with_state(state)
}
