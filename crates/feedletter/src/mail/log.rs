use async_trait::async_trait;

use feedletter_core::mail::{MailError, Mailer, OutgoingMail};

/// Mailer that writes mail to the log instead of sending it.
///
/// Used when no SMTP relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "SMTP not configured, mail logged only"
        );
        tracing::debug!(to = %mail.to, body = %mail.text, "Logged mail body");
        Ok(())
    }
}
