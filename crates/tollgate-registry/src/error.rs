use http::StatusCode;
use tollgate_core::HttpError;

/// Errors returned by the registry client
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// HTTP transport or connection error
    #[error("registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The registry returned a non-success status
    #[error("registry API error ({status}): {message}")]
    Api {
        /// HTTP status from the registry
        status: u16,
        /// Response body text, verbatim
        message: String,
    },

    /// A success response whose body did not have the expected shape
    #[error("invalid registry response: {0}")]
    Decode(String),

    /// The configured base URL cannot carry path segments
    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),
}

impl HttpError for RegistryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Api { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Decode(_) => StatusCode::BAD_GATEWAY,
            Self::Request(_) | Self::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Api { .. } | Self::Decode(_) => "upstream_error",
            Self::Request(_) | Self::InvalidUrl(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Api { .. } | Self::Decode(_) => "Registry request failed".to_owned(),
            Self::Request(_) | Self::InvalidUrl(_) => "Internal server error".to_owned(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message.clone()),
            Self::Decode(message) => Some(message.clone()),
            _ => None,
        }
    }
}
