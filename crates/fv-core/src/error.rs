use thiserror::Error;

pub type FvResult<T> = Result<T, FvError>;

/// Error taxonomy for the fragment pipeline.
///
/// `Store` is the only locally retryable failure; the orchestrator decides
/// how many attempts a fragment gets before it settles at `failed`. All
/// other variants propagate to the caller.
#[derive(Debug, Error)]
pub enum FvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid master secret: {0}")]
    InvalidSecret(String),

    #[error("invalid fragment index {index}: {reason}")]
    InvalidIndex { index: u32, reason: String },

    #[error("authentication failed for fragment {index}: tampered, corrupted, or wrong key")]
    Authentication { index: u32 },

    #[error("store error: {0}")]
    Store(String),

    #[error("content id not found: {0}")]
    NotFound(String),

    #[error("no fragment with index {index} in manifest")]
    UnknownFragment { index: u32 },

    #[error("manifest serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FvError {
    /// True for failures the orchestrator may retry (transport/backend).
    pub fn is_retryable(&self) -> bool {
        matches!(self, FvError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_retryable() {
        assert!(FvError::Store("backend 503".into()).is_retryable());
        assert!(!FvError::InvalidSecret("bad checksum".into()).is_retryable());
        assert!(!FvError::Authentication { index: 3 }.is_retryable());
        assert!(!FvError::NotFound("abc".into()).is_retryable());
    }

    #[test]
    fn messages_carry_the_affected_index() {
        let err = FvError::Authentication { index: 7 };
        assert!(err.to_string().contains('7'));

        let err = FvError::UnknownFragment { index: 12 };
        assert!(err.to_string().contains("12"));
    }
}
