//! Classification of token endpoint error codes.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// The user has not entered the confirmation code yet.
pub const AUTHORIZATION_PENDING: &str = "authorization_pending";
/// Unknown or blocked application, or a wrong client secret.
pub const INVALID_CLIENT: &str = "invalid_client";
/// Wrong or expired confirmation code.
pub const INVALID_GRANT: &str = "invalid_grant";

static KNOWN_CODES: OnceLock<HashMap<&'static str, ClassifiedError>> = OnceLock::new();

/// Outcome of interpreting a rejected token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    /// Keep polling. Never leaves the poll loop.
    Pending,
    InvalidGrant,
    InvalidClient,
    /// An error code outside the known set, preserved verbatim.
    Unrecognized(String),
    /// Non-success status without a usable error body.
    MalformedResponse,
}

impl ClassifiedError {
    /// Whether the poll loop should stop on this error.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The raw provider code this classification stands for.
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::Pending => Some(AUTHORIZATION_PENDING),
            Self::InvalidGrant => Some(INVALID_GRANT),
            Self::InvalidClient => Some(INVALID_CLIENT),
            Self::Unrecognized(code) => Some(code),
            Self::MalformedResponse => None,
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provider_code() {
            Some(code) => f.write_str(code),
            None => f.write_str("malformed_response"),
        }
    }
}

fn known_codes() -> &'static HashMap<&'static str, ClassifiedError> {
    KNOWN_CODES.get_or_init(|| {
        HashMap::from([
            (AUTHORIZATION_PENDING, ClassifiedError::Pending),
            (INVALID_CLIENT, ClassifiedError::InvalidClient),
            (INVALID_GRANT, ClassifiedError::InvalidGrant),
        ])
    })
}

/// Map a provider error code to its classification.
///
/// Total: codes outside the known set come back as
/// [`ClassifiedError::Unrecognized`] with the original string.
pub fn classify(code: &str) -> ClassifiedError {
    known_codes()
        .get(code)
        .cloned()
        .unwrap_or_else(|| ClassifiedError::Unrecognized(code.to_string()))
}
