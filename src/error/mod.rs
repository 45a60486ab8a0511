//! Error types for yandex-auth.

use thiserror::Error;

use crate::auth::classify::{ClassifiedError, AUTHORIZATION_PENDING, INVALID_CLIENT, INVALID_GRANT};
use crate::auth::poller::CancelReason;

/// Primary error type for all authorization operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Incorrect or expired confirmation code")]
    InvalidGrant,

    #[error("Client id or client secret rejected by the provider")]
    InvalidClient,

    #[error("Provider error {code}{}", describe(.description))]
    Unrecognized {
        code: String,
        description: Option<String>,
    },

    #[error("Provider rejected the request without an error body")]
    MalformedResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authorization cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The provider rejected the code or the client credentials.
    Authentication,
    /// The provider answered outside its documented contract.
    Protocol,
    Network,
    Serialization,
    Cancelled,
    Configuration,
}

impl AuthError {
    /// Build an error from a classified provider response.
    ///
    /// `Pending` only has meaning inside the poll loop; anywhere else it is
    /// reported as an unrecognized code.
    pub fn from_classified(error: ClassifiedError, description: Option<String>) -> Self {
        match error {
            ClassifiedError::InvalidGrant => Self::InvalidGrant,
            ClassifiedError::InvalidClient => Self::InvalidClient,
            ClassifiedError::MalformedResponse => Self::MalformedResponse,
            ClassifiedError::Pending => Self::Unrecognized {
                code: AUTHORIZATION_PENDING.to_string(),
                description,
            },
            ClassifiedError::Unrecognized(code) => Self::Unrecognized { code, description },
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidGrant | Self::InvalidClient => ErrorCategory::Authentication,
            Self::Unrecognized { .. } | Self::MalformedResponse => ErrorCategory::Protocol,
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether a caller may reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    /// Raw error code returned by the provider, when there was one.
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::InvalidGrant => Some(INVALID_GRANT),
            Self::InvalidClient => Some(INVALID_CLIENT),
            Self::Unrecognized { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<ClassifiedError> for AuthError {
    fn from(error: ClassifiedError) -> Self {
        Self::from_classified(error, None)
    }
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;
