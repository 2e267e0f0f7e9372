//! Error types for authentication and session operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the authentication core.
///
/// Every failure crossing the security boundary is one of these typed
/// variants, never a raw error with stack traces or internal detail.
/// User-visible text comes from [`AuthError::public_message`]; the full
/// variant is for the audit trail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Credential Errors
    // ═══════════════════════════════════════════════════════════
    /// Wrong email or password. Deliberately generic and non-enumerable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account locked by policy. Audit-only distinction: the public
    /// message is identical to [`AuthError::InvalidCredentials`] to
    /// prevent account-status probing.
    #[error("Account is locked")]
    AccountLocked,

    /// Account suspended by an operator. Audit-only distinction, same
    /// public message as [`AuthError::InvalidCredentials`].
    #[error("Account is suspended")]
    AccountSuspended,

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════
    /// Session not found or already revoked; caller must re-authenticate.
    #[error("Session not found or inactive")]
    SessionNotFound,

    /// Session past its expiry; caller must re-authenticate.
    #[error("Session has expired")]
    SessionExpired,

    /// Refresh token rejected; caller must re-authenticate from scratch.
    #[error("Invalid refresh token")]
    RefreshTokenInvalid,

    // ═══════════════════════════════════════════════════════════
    // MFA Errors
    // ═══════════════════════════════════════════════════════════
    /// No live challenge for this user: expired, consumed, or never
    /// issued. Recoverable by resend.
    #[error("Verification code has expired or was not found")]
    CodeExpired,

    /// Submitted code does not match the live challenge. Recoverable by
    /// retry or resend.
    #[error("Verification code is incorrect")]
    CodeMismatch,

    /// Rate-limit trip on resend or verify; HTTP 429 semantics.
    #[error("Too many attempts, please retry after {retry_after:?}")]
    TooManyAttempts {
        /// Duration to wait before retrying.
        retry_after: std::time::Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════
    /// Durable-store operation failed. Always propagated; no session
    /// operation may silently succeed without store confirmation.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Fast-cache operation failed. Read paths fail open to the durable
    /// store; write paths surface this only when correctness requires it.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Cache value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// MFA code delivery failed and the configured policy is to fail
    /// the request.
    #[error("Failed to send verification code")]
    EmailDeliveryFailed,

    /// Internal error (never exposed to users with detail).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if this error is due to user input and safe to
    /// surface (with the generic [`Self::public_message`]).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::AccountLocked
                | Self::AccountSuspended
                | Self::CodeExpired
                | Self::CodeMismatch
                | Self::RefreshTokenInvalid
        )
    }

    /// Returns `true` if the caller can recover without a fresh login
    /// (retry the code or request a resend).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::CodeExpired | Self::CodeMismatch)
    }

    /// Returns `true` for rate-limit trips (HTTP 429 semantics).
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::TooManyAttempts { .. })
    }

    /// Short, generic message safe to return across the security
    /// boundary.
    ///
    /// Locked and suspended accounts intentionally collapse into the
    /// invalid-credentials message so the API surface cannot be used to
    /// probe account status; the distinction lives only in the audit
    /// trail.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials | Self::AccountLocked | Self::AccountSuspended => {
                "Invalid email or password"
            }
            Self::SessionNotFound => "Session not found or inactive",
            Self::SessionExpired => "Session has expired",
            Self::RefreshTokenInvalid => "Invalid refresh token",
            Self::CodeExpired => "Verification code has expired, please request a new one",
            Self::CodeMismatch => "Verification code is incorrect",
            Self::TooManyAttempts { .. } => "Too many attempts, please try again later",
            Self::EmailDeliveryFailed => "Could not send verification code",
            Self::DatabaseError(_)
            | Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::InternalError(_) => "Something went wrong, please try again",
        }
    }
}
