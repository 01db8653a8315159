use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::HeaderMap;
use tollgate_identity::{Accounts, IdentityError};

use crate::ApiError;

/// Resolve the bearer token, when present, to a live session
///
/// A resolved session is attached as an [`Authenticated`] extension.
/// Requests without one pass through untouched; the route's extractor
/// decides whether that is acceptable. A failing user store ends the
/// request with its own error instead of treating the caller as anonymous.
///
/// [`Authenticated`]: tollgate_identity::Authenticated
pub async fn session_middleware(State(accounts): State<Accounts>, mut request: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match accounts.authenticate(&token).await {
            Ok(authenticated) => {
                request.extensions_mut().insert(authenticated);
            }
            Err(IdentityError::Unauthenticated) => {
                tracing::debug!("bearer token did not resolve to a session");
            }
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    next.run(request).await
}

/// Extract the token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}
