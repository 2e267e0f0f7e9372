//! Explicit configuration for the authentication core.
//!
//! Components receive an [`AuthConfig`] at construction time instead of
//! reading process-wide environment state; the orchestrator exposes a
//! reload entry point that swaps the config without restarting.

use crate::constants;
use chrono::Duration;

/// What to do when the notification sender fails while issuing an MFA
/// code. A deployment decision, not a hardcoded fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryFailurePolicy {
    /// Fail the issue operation and discard the stored challenge. The
    /// caller sees [`crate::AuthError::EmailDeliveryFailed`]. Production
    /// default.
    #[default]
    Fail,

    /// Log the failure and keep the challenge live. Development
    /// convenience for use with the console notifier.
    LogOnly,
}

/// Configuration for the authentication core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Fixed session window; `expires_at = now + session_lifetime`,
    /// recomputed on refresh.
    pub session_lifetime: Duration,

    /// Remaining lifetime below which listings flag a session as
    /// expiring soon.
    pub expiring_soon: Duration,

    /// MFA challenge time-to-live.
    pub mfa_code_ttl: Duration,

    /// Resend attempts allowed per window before lockout.
    pub mfa_max_resends: u32,

    /// Rolling window for the resend counter.
    pub mfa_resend_window: std::time::Duration,

    /// Failed verification attempts allowed per window before lockout.
    pub mfa_max_failures: u32,

    /// Rolling window for the failed-verification counter.
    pub mfa_failure_window: std::time::Duration,

    /// Bound on a single fast-cache call; on timeout the read path
    /// falls through to the durable store.
    pub cache_timeout: std::time::Duration,

    /// bcrypt cost for newly hashed passwords.
    pub bcrypt_cost: u32,

    /// Behavior when MFA code delivery fails.
    pub delivery_failure: DeliveryFailurePolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime: Duration::seconds(constants::SESSION_LIFETIME_SECS),
            expiring_soon: Duration::seconds(constants::EXPIRING_SOON_SECS),
            mfa_code_ttl: Duration::seconds(constants::MFA_CODE_TTL_SECS),
            mfa_max_resends: constants::MFA_MAX_RESENDS,
            mfa_resend_window: std::time::Duration::from_secs(constants::MFA_RESEND_WINDOW_SECS),
            mfa_max_failures: constants::MFA_MAX_FAILURES,
            mfa_failure_window: std::time::Duration::from_secs(constants::MFA_FAILURE_WINDOW_SECS),
            cache_timeout: std::time::Duration::from_millis(constants::CACHE_TIMEOUT_MS),
            bcrypt_cost: constants::BCRYPT_COST,
            delivery_failure: DeliveryFailurePolicy::Fail,
        }
    }
}

impl AuthConfig {
    /// Load configuration from `BANKAUTH_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    ///
    /// Recognized variables:
    /// - `BANKAUTH_SESSION_LIFETIME_SECS`
    /// - `BANKAUTH_MFA_CODE_TTL_SECS`
    /// - `BANKAUTH_MFA_MAX_RESENDS`
    /// - `BANKAUTH_MFA_MAX_FAILURES`
    /// - `BANKAUTH_BCRYPT_COST`
    /// - `BANKAUTH_MFA_DELIVERY_FAILURE` (`fail` | `log-only`)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<i64>("BANKAUTH_SESSION_LIFETIME_SECS") {
            config.session_lifetime = Duration::seconds(secs);
        }
        if let Some(secs) = env_parse::<i64>("BANKAUTH_MFA_CODE_TTL_SECS") {
            config.mfa_code_ttl = Duration::seconds(secs);
        }
        if let Some(n) = env_parse::<u32>("BANKAUTH_MFA_MAX_RESENDS") {
            config.mfa_max_resends = n;
        }
        if let Some(n) = env_parse::<u32>("BANKAUTH_MFA_MAX_FAILURES") {
            config.mfa_max_failures = n;
        }
        if let Some(cost) = env_parse::<u32>("BANKAUTH_BCRYPT_COST") {
            // Below 12 the hash no longer counts as adaptive enough for
            // credential storage.
            config.bcrypt_cost = cost.max(constants::BCRYPT_COST);
        }
        if let Ok(policy) = std::env::var("BANKAUTH_MFA_DELIVERY_FAILURE") {
            match policy.as_str() {
                "log-only" => config.delivery_failure = DeliveryFailurePolicy::LogOnly,
                "fail" => config.delivery_failure = DeliveryFailurePolicy::Fail,
                other => {
                    tracing::warn!(value = %other, "Unknown MFA delivery failure policy, keeping default");
                }
            }
        }

        config
    }

    /// Session lifetime in whole seconds (for store TTL arithmetic).
    #[must_use]
    pub fn session_lifetime_secs(&self) -> i64 {
        self.session_lifetime.num_seconds()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
