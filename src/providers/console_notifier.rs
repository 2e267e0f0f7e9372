//! Console notifier for development and testing.

use crate::error::Result;
use crate::providers::NotificationSender;
use chrono::Duration;
use tracing::{info, warn};

/// Console notification sender.
///
/// This sender logs messages to the console instead of delivering them.
/// Useful for development and testing where you don't want to send real
/// emails. Pair it with
/// [`DeliveryFailurePolicy::LogOnly`](crate::config::DeliveryFailurePolicy)
/// in development setups.
///
/// # Examples
///
/// ```ignore
/// use bankauth::providers::ConsoleNotifier;
///
/// let notifier = ConsoleNotifier::new();
/// notifier.send_mfa_code(
///     "user@example.com",
///     "Jane Doe",
///     "042137",
///     chrono::Duration::minutes(10),
/// ).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Create a new console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationSender for ConsoleNotifier {
    async fn send_mfa_code(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
        expires_in: Duration,
    ) -> Result<()> {
        let expires_minutes = expires_in.num_minutes();

        info!(
            to = %to,
            code = %code,
            expires_in = %expires_minutes,
            "📧 MFA Code Email (Development Mode)"
        );
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 VERIFICATION CODE EMAIL                      ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ To: {to:<57}║");
        println!("║ Subject: Your verification code{:<31}║", "");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║                                                              ║");
        println!("║ Hi {display_name:<59}║");
        println!("║                                                              ║");
        println!("║ Your verification code is:                                   ║");
        println!("║                                                              ║");
        println!("║                        {code:<38}║");
        println!("║                                                              ║");
        println!("║ This code will expire in {expires_minutes} minutes.{:<23}║", "");
        println!("║ If you did not request it, contact support.                  ║");
        println!("║                                                              ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        Ok(())
    }

    async fn send_security_alert(&self, to: &str, subject: &str, message: &str) -> Result<()> {
        warn!(
            to = %to,
            subject = %subject,
            "🚨 Security Alert Email (Development Mode)"
        );
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   SECURITY ALERT                             ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ To: {to:<57}║");
        println!("║ Subject: {subject:<51}║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║                                                              ║");

        // Wrap the message to the box width. Chunk on characters, not
        // bytes; multi-byte text must never split mid-character.
        for line in message.lines() {
            let mut chars = line.chars().peekable();
            while chars.peek().is_some() {
                let chunk: String = chars.by_ref().take(60).collect();
                println!("║ {chunk:<61}║");
            }
        }

        println!("║                                                              ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_alert_renders_multibyte_text_across_the_wrap_boundary() {
        let notifier = ConsoleNotifier::new();

        // One leading ASCII byte pushes every two-byte character onto an
        // odd byte offset, so byte-indexed wrapping would split one.
        let message = format!("a{}", "é".repeat(70));
        notifier
            .send_security_alert("kunde@example.com", "Passwort geändert", &message)
            .await
            .expect("alert with multi-byte text should render");

        let message = "Ihr Passwort wurde soeben geändert und alle anderen Geräte \
                       wurden abgemeldet. Falls Sie das nicht waren, wenden Sie sich \
                       bitte sofort an den Support.";
        notifier
            .send_security_alert("kunde@example.com", "Passwort geändert", message)
            .await
            .expect("alert with multi-byte text should render");
    }
}
