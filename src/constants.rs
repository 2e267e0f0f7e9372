//! Default tunables for the authentication core.
//!
//! All of these are defaults for [`crate::config::AuthConfig`]; nothing
//! reads them as ambient process state.

/// Session lifetime in seconds (24 hours, fixed window recomputed on
/// refresh).
pub const SESSION_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Remaining lifetime below which a session is flagged as expiring soon
/// in listings (1 hour).
pub const EXPIRING_SOON_SECS: i64 = 60 * 60;

/// MFA challenge time-to-live in seconds.
pub const MFA_CODE_TTL_SECS: i64 = 600;

/// Number of digits in an MFA code.
pub const MFA_CODE_DIGITS: u32 = 6;

/// Resend attempts allowed per rolling window before lockout.
pub const MFA_MAX_RESENDS: u32 = 3;

/// Rolling window for the resend counter, in seconds.
pub const MFA_RESEND_WINDOW_SECS: u64 = 15 * 60;

/// Failed verification attempts allowed per rolling window before
/// lockout (conservative explicit threshold).
pub const MFA_MAX_FAILURES: u32 = 5;

/// Rolling window for the failed-verification counter, in seconds.
pub const MFA_FAILURE_WINDOW_SECS: u64 = 15 * 60;

/// Bound on a single fast-cache call before the read path fails open to
/// the durable store, in milliseconds.
pub const CACHE_TIMEOUT_MS: u64 = 250;

/// Days an expired session row is retained for audit before the cleanup
/// sweep hard-deletes it.
pub const SESSION_RETENTION_DAYS: i64 = 30;

/// bcrypt cost for newly hashed passwords.
pub const BCRYPT_COST: u32 = 12;

/// Audit action identifiers recorded at each state transition.
pub mod audit_actions {
    /// Failed login attempt (wrong credentials or bad account status).
    pub const LOGIN_FAILED: &str = "LOGIN_FAILED";

    /// Credentials verified and session created.
    pub const LOGIN_SUCCEEDED: &str = "LOGIN_SUCCEEDED";

    /// MFA code issued and dispatched.
    pub const MFA_CODE_ISSUED: &str = "MFA_CODE_ISSUED";

    /// MFA step completed, session fully authenticated.
    pub const MFA_VERIFIED: &str = "MFA_VERIFIED";

    /// MFA verification failed (wrong or expired code).
    pub const MFA_FAILED: &str = "MFA_FAILED";

    /// Resend or verification lockout tripped.
    pub const MFA_LOCKOUT: &str = "MFA_LOCKOUT";

    /// Explicit logout of a single session.
    pub const LOGOUT: &str = "LOGOUT";

    /// Mass sign-out of a user's other sessions.
    pub const LOGOUT_ALL: &str = "LOGOUT_ALL";

    /// Password changed; other sessions revoked.
    pub const PASSWORD_CHANGED: &str = "PASSWORD_CHANGED";

    /// MFA requirement toggled for a user.
    pub const MFA_SETTING_CHANGED: &str = "MFA_SETTING_CHANGED";

    /// Session annotated as suspicious.
    pub const SESSION_FLAGGED: &str = "SESSION_FLAGGED";

    /// Token refresh rejected.
    pub const REFRESH_REJECTED: &str = "REFRESH_REJECTED";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_conservative() {
        assert!(MFA_MAX_FAILURES >= MFA_MAX_RESENDS);
        assert!(BCRYPT_COST >= 12);
        assert!(MFA_CODE_TTL_SECS <= SESSION_LIFETIME_SECS);
    }
}
