//! Error types for key issuance and redemption.

use thiserror::Error;

/// Licensing-specific errors.
///
/// Only caller-side failures live here. A redemption that is refused by the
/// key's lifecycle (already used, expired) is a [`crate::Redemption`] outcome,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// Requested duration is missing, non-numeric, not positive, or too large.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// No key with the given token has been issued.
    #[error("license key not found")]
    KeyNotFound,
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
