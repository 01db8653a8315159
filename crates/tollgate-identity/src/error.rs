use http::StatusCode;
use tollgate_core::HttpError;

/// Identity and session errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Signup input failed validation; the message is shown to the client
    #[error("{0}")]
    Validation(String),

    /// An account with this email already exists
    #[error("User already exists")]
    AlreadyExists,

    /// Login email or password did not match
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, unknown or dangling session token
    #[error("Authentication required")]
    Unauthenticated,

    /// No user with this id
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Reading or writing the user file failed
    #[error("user store persistence failed: {0}")]
    Persistence(String),
}

impl HttpError for IdentityError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::AlreadyExists => "conflict",
            Self::InvalidCredentials | Self::Unauthenticated => "authentication_error",
            Self::UserNotFound(_) => "not_found",
            Self::Persistence(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::UserNotFound(_) => "User not found".to_owned(),
            Self::Persistence(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}
