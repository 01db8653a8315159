use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use tollgate_billing::BillingError;
use tollgate_core::HttpError;
use tollgate_forward::ForwardError;
use tollgate_identity::IdentityError;

/// Error response rendered as `{ "error": ..., "details": ... }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Convert a domain error, logging server-side failures in full
    fn from_http<E: HttpError>(error: &E) -> Self {
        let status = error.status_code();

        if status.is_server_error() {
            tracing::error!(error = %error, error_type = error.error_type(), status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %error, error_type = error.error_type(), status = status.as_u16(), "request rejected");
        }

        Self {
            status,
            message: error.client_message(),
            details: error.details(),
        }
    }
}

macro_rules! impl_from_http_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(error: $error) -> Self {
                    Self::from_http(&error)
                }
            }
        )+
    };
}

impl_from_http_error!(IdentityError, BillingError, ForwardError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            details: self.details.as_deref(),
        };

        (self.status, Json(body)).into_response()
    }
}
