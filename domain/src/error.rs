use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("permission denied for {capability}")]
    PermissionDenied { capability: String },

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn permission_denied(capability: &str) -> Self {
        Self::PermissionDenied {
            capability: capability.to_string(),
        }
    }

    pub fn invalid_transition(message: &str) -> Self {
        Self::InvalidTransition(message.to_string())
    }

    pub fn external_service_error(service: &str, message: &str) -> Self {
        Self::ExternalService {
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self::Internal(message.to_string())
    }
}
