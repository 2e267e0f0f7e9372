//! User directory trait.

use crate::error::Result;
use crate::state::{UserId, UserRecord};
use chrono::{DateTime, Utc};

/// User Profile Service client.
///
/// The full user record is owned externally; the core reads it to
/// complete login/MFA/profile flows and mutates only the MFA flag, the
/// last-login timestamp and (through the password-change flow) the
/// password hash.
pub trait UserDirectory: Send + Sync {
    /// Look up a user by normalized email.
    ///
    /// Returns `None` when no such user exists; the caller is
    /// responsible for keeping that outcome indistinguishable from a
    /// wrong password.
    ///
    /// # Errors
    ///
    /// Returns error if the directory query fails.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>>> + Send;

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns error if the directory query fails.
    fn get_by_id(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>>> + Send;

    /// Toggle the MFA requirement for a user.
    ///
    /// # Errors
    ///
    /// Returns error if the directory update fails.
    fn set_mfa_enabled(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns error if the directory update fails.
    fn record_login(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Replace the stored password hash.
    ///
    /// The hash is produced by the credential verifier; the directory
    /// never sees a raw password.
    ///
    /// # Errors
    ///
    /// Returns error if the directory update fails.
    fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
