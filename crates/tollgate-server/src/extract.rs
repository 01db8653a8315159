use std::convert::Infallible;

use axum::extract::{FromRequest, FromRequestParts, Request};
use bytes::Bytes;
use http::StatusCode;
use http::request::Parts;
use serde::de::DeserializeOwned;
use tollgate_identity::{Authenticated, IdentityError};

use crate::ApiError;

/// Requires a live session resolved by the session middleware
pub struct RequireAuth(pub Authenticated);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated>()
            .cloned()
            .map(Self)
            .ok_or_else(|| IdentityError::Unauthenticated.into())
    }
}

/// The caller's session when one was presented, otherwise `None`
pub struct OptionalAuth(pub Option<Authenticated>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Authenticated>().cloned()))
    }
}

/// Lenient JSON body
///
/// An empty body deserializes as `T::default()`, so a missing field is
/// reported by the handler's own validation rather than as a parse failure.
/// The content type is not checked.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| ApiError::new(rejection.status(), "Failed to read request body"))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON body").with_details(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        #[serde(default)]
        connection_id: Option<String>,
    }

    async fn extract(body: &'static str) -> Result<Payload, ApiError> {
        let request = http::Request::builder().method("POST").uri("/").body(Body::from(body)).unwrap();
        JsonBody::<Payload>::from_request(request, &()).await.map(|JsonBody(payload)| payload)
    }

    #[tokio::test]
    async fn empty_body_is_default() {
        assert_eq!(extract("").await.unwrap(), Payload::default());
        assert_eq!(extract("  \n").await.unwrap(), Payload::default());
    }

    #[tokio::test]
    async fn body_without_content_type_is_parsed() {
        let payload = extract(r#"{"connectionId":"c_1"}"#).await.unwrap();
        assert_eq!(payload.connection_id.as_deref(), Some("c_1"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = extract("{not json").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_session_is_rejected() {
        let (mut parts, ()) = http::Request::builder().uri("/").body(()).unwrap().into_parts();

        let err = RequireAuth::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let OptionalAuth(auth) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(auth.is_none());
    }
}
