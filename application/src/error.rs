use capture_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("no media selected for upload")]
    NoItemsSelected,

    #[error("an internet connection is required to submit")]
    ConnectivityRequired,

    #[error("storage quota exceeded ({used_units}/{quota_units})")]
    QuotaExceeded { used_units: u64, quota_units: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}
