//! Core domain types for the authentication system.
//!
//! All types are `Clone` and serializable so they can cross the
//! durable-store and cache boundaries unchanged.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque high-entropy session identifier.
///
/// 256 bits of randomness, base64url-encoded (43 characters). Generated
/// once at session creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new cryptographically secure random `SessionId`.
    #[must_use]
    pub fn generate() -> Self {
        use base64::Engine;
        use rand::RngCore;

        let mut random_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut random_bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Borrow the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════════════════

/// Device context captured at session creation, used for anomaly detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name (parsed from the user agent).
    pub device_name: Option<String>,

    /// Device class: "mobile", "tablet" or "desktop".
    pub device_type: Option<String>,

    /// Country derived from the client IP (if resolved upstream).
    pub country: Option<String>,

    /// City derived from the client IP (if resolved upstream).
    pub city: Option<String>,
}

/// Durable session record: one authenticated browser/device context.
///
/// The durable store owns this record; the cache holds a derived
/// [`CachedSession`] view of it. Sessions are soft-revoked on logout
/// (`is_active = false`) and hard-deleted only by the retention sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Primary key, generated at creation, never reused.
    pub session_id: SessionId,

    /// Owning user (many sessions per user).
    pub user_id: UserId,

    /// Opaque bearer access token issued alongside the session.
    /// Stored so the session row can revoke it; never inspected.
    pub access_token: String,

    /// Opaque bearer refresh token. Stored, never inspected.
    pub refresh_token: String,

    /// Client IP at creation.
    pub ip_address: IpAddr,

    /// Client user agent at creation.
    pub user_agent: String,

    /// Structured device context.
    pub device_info: DeviceInfo,

    /// False after logout/expiry/replacement; sessions are never
    /// hard-deleted on logout.
    pub is_active: bool,

    /// False until the MFA step completes for users that require it;
    /// true from creation for users without MFA.
    pub mfa_verified: bool,

    /// Set by anomaly checks; annotation only, never revokes by itself.
    pub is_suspicious: bool,

    /// Reason recorded alongside `is_suspicious`.
    pub suspicious_reason: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Touched on each durable-store validation.
    pub last_activity: DateTime<Utc>,

    /// Recomputed on refresh.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session can authorize requests iff it is active, MFA-verified
    /// and not past its expiry.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.mfa_verified && now < self.expires_at
    }
}

/// Public session descriptor returned by the session store.
///
/// Never carries the bearer tokens; those are store-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Session identifier.
    pub session_id: SessionId,

    /// Owning user.
    pub user_id: UserId,

    /// Whether the MFA step has completed.
    pub mfa_verified: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Current expiry.
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionDescriptor {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            user_id: session.user_id,
            mfa_verified: session.mfa_verified,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

/// One entry in a user's active-session listing, for UI display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,

    /// Client IP at creation.
    pub ip_address: IpAddr,

    /// Structured device context.
    pub device_info: DeviceInfo,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last validated activity.
    pub last_activity: DateTime<Utc>,

    /// Current expiry.
    pub expires_at: DateTime<Utc>,

    /// Remaining lifetime under one hour. UI hint only.
    pub is_expiring_soon: bool,

    /// Flagged by anomaly checks.
    pub is_suspicious: bool,
}

/// Derived cache mirror of a session row.
///
/// Stored under `session:{session_id}` with TTL equal to the remaining
/// durable-store lifetime. Always rebuilt from store-computed remaining
/// time, never from a client-supplied expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    /// Owning user.
    pub user_id: UserId,

    /// Client IP at creation (for anomaly checks on the hot path).
    pub ip_address: IpAddr,

    /// Expiry copied from the durable row.
    pub expires_at: DateTime<Utc>,

    /// MFA state copied from the durable row.
    pub mfa_verified: bool,

    /// Creation timestamp copied from the durable row.
    pub created_at: DateTime<Utc>,
}

impl CachedSession {
    /// Build the cache view of a durable row.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            ip_address: session.ip_address,
            expires_at: session.expires_at,
            mfa_verified: session.mfa_verified,
            created_at: session.created_at,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tokens
// ═══════════════════════════════════════════════════════════════════════

/// Opaque bearer token pair issued at login.
///
/// The session store treats both as opaque strings it stores and returns,
/// never inspects or decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    pub access_token: String,

    /// Refresh token.
    pub refresh_token: String,
}

// ═══════════════════════════════════════════════════════════════════════
// MFA
// ═══════════════════════════════════════════════════════════════════════

/// Ephemeral MFA verification attempt.
///
/// Lives only in the fast cache under `mfa_challenge:{user_id}`; a
/// challenge that outlives its TTL is unrecoverable and the user must
/// request a new one. At most one live challenge per user: issuing a
/// new code overwrites the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaChallenge {
    /// User the challenge was issued to.
    pub user_id: UserId,

    /// Six-digit numeric code, zero-padded.
    pub code: String,

    /// Issue timestamp.
    pub created_at: DateTime<Utc>,

    /// Expiry (fixed TTL from issue).
    pub expires_at: DateTime<Utc>,
}

impl MfaChallenge {
    /// Build a challenge expiring `ttl` after `now`.
    #[must_use]
    pub fn new(user_id: UserId, code: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            code,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Users (owned externally, read-mostly)
// ═══════════════════════════════════════════════════════════════════════

/// Account standing as recorded by the external User Profile Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Account in good standing.
    Active,
    /// Locked by policy (e.g. repeated failures); audit-only distinction.
    Locked,
    /// Suspended by an operator; audit-only distinction.
    Suspended,
}

impl AccountStatus {
    /// Stable string form used in storage and audit payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Locked => "locked",
            Self::Suspended => "suspended",
        }
    }

    /// Parse from the stable string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input if it is not a known status.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "active" => Ok(Self::Active),
            "locked" => Ok(Self::Locked),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("Unknown account status: {other}")),
        }
    }
}

/// User record as read from the external User Profile Service.
///
/// The core reads these fields and mutates only `mfa_enabled`,
/// `last_login` and (via the password-change flow) `password_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier.
    pub user_id: UserId,

    /// Normalized email address.
    pub email: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Salted adaptive password hash (bcrypt-class). Never logged.
    pub password_hash: String,

    /// Whether this user requires the MFA step at login.
    pub mfa_enabled: bool,

    /// Account standing.
    pub status: AccountStatus,

    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Display name used in notification emails.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Public profile view of this record.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            mfa_enabled: self.mfa_enabled,
        }
    }
}

/// Public profile subset returned to callers after authentication.
///
/// Never carries the password hash or account status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub user_id: UserId,

    /// Email address.
    pub email: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Whether MFA is enabled for this user.
    pub mfa_enabled: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session_fixture(now: DateTime<Utc>) -> Session {
        Session {
            session_id: SessionId::generate(),
            user_id: UserId::new(),
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            ip_address: "127.0.0.1".parse().unwrap(),
            user_agent: "Test".to_string(),
            device_info: DeviceInfo::default(),
            is_active: true,
            mfa_verified: true,
            is_suspicious: false,
            suspicious_reason: None,
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::hours(24),
        }
    }

    #[test]
    fn test_session_id_generation() {
        let id1 = SessionId::generate();
        let id2 = SessionId::generate();

        assert_ne!(id1, id2);

        // 256 bits base64url encoded without padding
        assert_eq!(id1.as_str().len(), 43);
    }

    #[test]
    fn test_user_id_generation() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_session_usability_invariant() {
        let now = Utc::now();
        let mut session = session_fixture(now);

        assert!(session.is_usable(now));

        session.mfa_verified = false;
        assert!(!session.is_usable(now));

        session.mfa_verified = true;
        session.is_active = false;
        assert!(!session.is_usable(now));

        session.is_active = true;
        assert!(!session.is_usable(now + Duration::hours(25)));
    }

    #[test]
    fn test_cached_session_mirrors_row() {
        let now = Utc::now();
        let session = session_fixture(now);
        let cached = CachedSession::from_session(&session);

        assert_eq!(cached.user_id, session.user_id);
        assert_eq!(cached.expires_at, session.expires_at);
        assert_eq!(cached.mfa_verified, session.mfa_verified);
    }

    #[test]
    fn test_account_status_round_trip() {
        for status in [
            AccountStatus::Active,
            AccountStatus::Locked,
            AccountStatus::Suspended,
        ] {
            assert_eq!(AccountStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(AccountStatus::from_str("frozen").is_err());
    }
}
