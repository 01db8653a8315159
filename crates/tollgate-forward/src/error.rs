use http::StatusCode;
use tollgate_core::HttpError;

/// Proxy and forward-token errors
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The `?u=` query parameter was not supplied
    #[error("Missing target URL parameter (?u=)")]
    MissingTarget,

    /// The `X-Connection-Secret` header is absent or not a usable secret
    #[error("Missing X-Connection-Secret header")]
    MissingSecretHeader,

    /// A forward token was requested without a usable connection secret
    #[error("Missing connectionSecret")]
    MissingConnectionSecret,

    /// The upstream call failed before a response could be relayed
    #[error("Proxy error: {0}")]
    Proxy(String),
}

impl HttpError for ForwardError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::MissingConnectionSecret => StatusCode::BAD_REQUEST,
            Self::MissingSecretHeader => StatusCode::UNAUTHORIZED,
            Self::Proxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::MissingTarget | Self::MissingConnectionSecret => "validation_error",
            Self::MissingSecretHeader => "authentication_error",
            Self::Proxy(_) => "upstream_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Proxy(_) => "Proxy error".to_owned(),
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Proxy(message) => Some(message.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_failure_carries_details() {
        let err = ForwardError::Proxy("connection refused".to_owned());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Proxy error");
        assert_eq!(err.details().as_deref(), Some("connection refused"));
    }

    #[test]
    fn secret_header_is_an_auth_failure() {
        assert_eq!(ForwardError::MissingSecretHeader.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ForwardError::MissingConnectionSecret.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ForwardError::MissingTarget.client_message(),
            "Missing target URL parameter (?u=)"
        );
    }
}
