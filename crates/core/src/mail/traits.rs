use async_trait::async_trait;

use super::{MailError, OutgoingMail};

/// Delivers email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one mail. Returns once the transport has accepted it.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}
