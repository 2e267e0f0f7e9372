//! SMTP notification sender implementation using Lettre.

use crate::error::{AuthError, Result};
use crate::providers::NotificationSender;
use chrono::Duration;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP notification sender using Lettre.
///
/// This sender delivers real emails via SMTP, suitable for production use.
///
/// # Configuration
///
/// - `smtp_server`: SMTP server address (e.g., "smtp.gmail.com")
/// - `smtp_port`: SMTP server port (usually 587 for TLS, 465 for SSL)
/// - `smtp_username`: SMTP authentication username
/// - `smtp_password`: SMTP authentication password
/// - `from_email`: Sender email address
/// - `from_name`: Sender display name
///
/// # Examples
///
/// ```ignore
/// use bankauth::providers::SmtpNotifier;
///
/// let notifier = SmtpNotifier::new(
///     "smtp.bank.example".to_string(),
///     587,
///     "auth@bank.example".to_string(),
///     "app_password".to_string(),
///     "noreply@bank.example".to_string(),
///     "Example Bank".to_string(),
/// )?;
/// ```
#[derive(Clone)]
pub struct SmtpNotifier {
    /// SMTP server address.
    smtp_server: String,

    /// SMTP server port.
    smtp_port: u16,

    /// SMTP credentials.
    credentials: Credentials,

    /// Sender email address.
    from_email: String,

    /// Sender display name.
    from_name: String,
}

impl SmtpNotifier {
    /// Create a new SMTP notification sender.
    ///
    /// # Arguments
    ///
    /// - `smtp_server`: SMTP server address
    /// - `smtp_port`: SMTP server port
    /// - `smtp_username`: SMTP authentication username
    /// - `smtp_password`: SMTP authentication password
    /// - `from_email`: Sender email address
    /// - `from_name`: Sender display name
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn new(
        smtp_server: String,
        smtp_port: u16,
        smtp_username: String,
        smtp_password: String,
        from_email: String,
        from_name: String,
    ) -> Result<Self> {
        let credentials = Credentials::new(smtp_username, smtp_password);

        Ok(Self {
            smtp_server,
            smtp_port,
            credentials,
            from_email,
            from_name,
        })
    }

    /// Build SMTP transport for sending emails.
    ///
    /// Creates a new transport for each email to avoid connection pooling issues.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP connection fails.
    fn build_transport(&self) -> Result<SmtpTransport> {
        Ok(SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| AuthError::InternalError(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    /// Build the "From" header.
    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Build and send one message, mapping every failure to the generic
    /// delivery error so callers can apply the configured policy.
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|_| AuthError::EmailDeliveryFailed)?,
            )
            .to(to.parse().map_err(|_| AuthError::EmailDeliveryFailed)?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|_| AuthError::EmailDeliveryFailed)?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer.send(&email).map_err(|e| {
                tracing::warn!(error = %e, "SMTP send failed");
                AuthError::EmailDeliveryFailed
            })
        })
        .await
        .map_err(|e| AuthError::InternalError(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

impl NotificationSender for SmtpNotifier {
    async fn send_mfa_code(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
        expires_in: Duration,
    ) -> Result<()> {
        let expires_minutes = expires_in.num_minutes();

        let html_body = format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Your verification code</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">Your verification code</h2>
        <p>Hi {display_name},</p>
        <p>Use the code below to finish signing in. It will expire in {expires_minutes} minutes.</p>
        <p style="margin: 30px 0; text-align: center;">
            <span style="display: inline-block; background-color: #f1f5f9; padding: 12px 24px; border-radius: 4px; font-size: 28px; letter-spacing: 8px; font-family: monospace;">
                {code}
            </span>
        </p>
        <p style="color: #666; font-size: 14px;">
            If you didn't try to sign in, contact support and consider changing your password.
        </p>
    </div>
</body>
</html>
            "#
        );

        self.send(to, "Your verification code", html_body).await
    }

    async fn send_security_alert(&self, to: &str, subject: &str, message: &str) -> Result<()> {
        let html_body = format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Security Alert</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #dc2626;">Security Alert</h2>
        <div style="background-color: #fef2f2; border-left: 4px solid #dc2626; padding: 15px; margin: 20px 0;">
            <p style="margin: 0;">{message}</p>
        </div>
        <p style="color: #666; font-size: 14px;">
            If you didn't perform this action, please secure your account immediately.
        </p>
    </div>
</body>
</html>
            "#
        );

        self.send(to, subject, html_body).await
    }
}
