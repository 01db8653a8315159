use http::StatusCode;
use tollgate_core::HttpError;
use tollgate_identity::IdentityError;
use tollgate_registry::RegistryError;

/// Billing errors
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Missing or unknown input; the message is shown to the client
    #[error("{0}")]
    Validation(String),

    /// The operation needs a signed-in user
    #[error("{0}")]
    Unauthenticated(String),

    /// Nothing to return for this user or connection
    #[error("{0}")]
    NotFound(String),

    /// The registry answered successfully but without required data
    #[error("{0}")]
    IncompleteUpstream(String),

    /// A registry call failed while performing `context`
    #[error("{context}: {source}")]
    Registry {
        context: &'static str,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl BillingError {
    /// Wrap a registry failure with the operation it interrupted
    pub fn registry(context: &'static str) -> impl FnOnce(RegistryError) -> Self {
        move |source| Self::Registry { context, source }
    }

    /// Whether the registry failure carries a status worth relaying
    fn relays_upstream(source: &RegistryError) -> bool {
        matches!(source, RegistryError::Api { .. } | RegistryError::Decode(_))
    }
}

impl HttpError for BillingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::IncompleteUpstream(_) => StatusCode::BAD_GATEWAY,
            Self::Registry { source, .. } if Self::relays_upstream(source) => source.status_code(),
            Self::Registry { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Identity(inner) => inner.status_code(),
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthenticated(_) => "authentication_error",
            Self::NotFound(_) => "not_found",
            Self::IncompleteUpstream(_) => "upstream_error",
            Self::Registry { source, .. } => source.error_type(),
            Self::Identity(inner) => inner.error_type(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Registry { context, source } if Self::relays_upstream(source) => (*context).to_owned(),
            Self::Registry { .. } => "Internal server error".to_owned(),
            Self::Identity(inner) => inner.client_message(),
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Registry { source, .. } => source.details(),
            Self::Identity(inner) => inner.details(),
            _ => None,
        }
    }
}
