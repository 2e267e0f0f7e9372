//! Notification sender trait.

use crate::error::Result;
use chrono::Duration;

/// Notification delivery service.
///
/// This trait abstracts over the mail/notification channel used to
/// deliver one-time MFA codes and security alerts. Delivery failures
/// are surfaced to the caller; whether they fail the primary operation
/// is a policy decision made there
/// (see [`crate::config::DeliveryFailurePolicy`]).
pub trait NotificationSender: Send + Sync {
    /// Deliver a one-time MFA code.
    ///
    /// # Arguments
    ///
    /// - `to`: Recipient email address
    /// - `display_name`: Recipient display name for the message body
    /// - `code`: Six-digit numeric code
    /// - `expires_in`: Remaining code validity, for the message body
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network request fails
    /// - The delivery provider rejects the request
    fn send_mfa_code(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
        expires_in: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Deliver a security alert (e.g. "other devices were signed out").
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network request fails
    /// - The delivery provider rejects the request
    fn send_security_alert(
        &self,
        to: &str,
        subject: &str,
        message: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
