use thiserror::Error;

/// Error taxonomy shared by every revenue-cycle subsystem.
#[derive(Error, Debug)]
pub enum RevenueError {
    /// Business-rule violations collected by a validator. Always carries
    /// the full list so callers can surface every finding at once.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Ownership or access mismatch (e.g. insurance plan owned by a
    /// different user than the claim).
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Clearinghouse transport or timeout failure. Retryable; must never
    /// be interpreted as an acceptance or a denial.
    #[error("Clearinghouse gateway error: {0}")]
    ExternalGateway(String),

    /// Claim graph cannot be rendered as valid EDI (e.g. zero diagnosis
    /// codes after aggregation). Not retried until the claim is corrected.
    #[error("EDI encoding error: {0}")]
    Encoding(String),

    /// Record-store failure.
    #[error("Record store error: {0}")]
    Store(String),

    /// Wrapped unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RevenueError {
    /// Single-message validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Whether the caller may retry the failed operation with backoff.
    /// Only transport-level failures qualify; business findings require
    /// correction first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalGateway(_) | Self::Store(_))
    }

    /// The messages an API layer should place in its `errors[]` array.
    /// Unexpected errors are collapsed to an opaque message so internals
    /// never leak to callers.
    pub fn error_messages(&self) -> Vec<String> {
        match self {
            Self::Validation(violations) => violations.clone(),
            Self::Other(_) | Self::Store(_) => vec!["Internal server error".to_string()],
            other => vec![other.to_string()],
        }
    }
}

/// Result type alias for revenue-cycle operations.
pub type RevenueResult<T> = std::result::Result<T, RevenueError>;

/// Structured error logging at subsystem boundaries.
pub fn log_error(context: &str, error: &RevenueError) {
    tracing::error!(
        context = context,
        error = %error,
        retryable = error.is_retryable(),
        "revenue cycle error"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_joins_messages() {
        let err = RevenueError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
        assert_eq!(err.error_messages(), vec!["a", "b"]);
    }

    #[test]
    fn retryability_is_transport_only() {
        assert!(RevenueError::ExternalGateway("timeout".into()).is_retryable());
        assert!(!RevenueError::validation("bad").is_retryable());
        assert!(!RevenueError::not_found("Claim", "c1").is_retryable());
    }

    #[test]
    fn internal_errors_are_opaque() {
        let err = RevenueError::Other(anyhow::anyhow!("connection pool exhausted"));
        assert_eq!(err.error_messages(), vec!["Internal server error"]);
    }
}
