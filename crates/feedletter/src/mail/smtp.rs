//! SMTP delivery through lettre.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use feedletter_core::mail::{MailError, Mailer, OutgoingMail};

use crate::config::SmtpConfig;

/// Port on which the relay expects implicit TLS instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Mailer sending through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport. No connection is made until the first send.
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self, MailError> {
        let from = parse_mailbox(from)?;

        let builder = if smtp.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?
        .port(smtp.port);

        let builder = match (&smtp.username, &smtp.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(host = %smtp.host, port = smtp.port, "SMTP mailer configured");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = build_message(&self.from, mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::debug!(to = %mail.to, subject = %mail.subject, "Mail sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("{address}: {e}")))
}

/// Builds the MIME message: multipart/alternative when an HTML part is
/// present, plain text otherwise.
fn build_message(from: &Mailbox, mail: &OutgoingMail) -> Result<Message, MailError> {
    let builder = Message::builder()
        .from(from.clone())
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.subject.as_str());

    let message = match &mail.html {
        Some(html) => {
            builder.multipart(MultiPart::alternative_plain_html(mail.text.clone(), html.clone()))
        }
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text.clone()),
    };

    message.map_err(|e| MailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Mailbox {
        parse_mailbox("Weekly <news@example.com>").unwrap()
    }

    #[test]
    fn test_multipart_message() {
        let mail = OutgoingMail::text("reader@example.com", "New post: Hello", "Hello")
            .with_html("<h2>Hello</h2>");

        let message = build_message(&sender(), &mail).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("Subject: New post: Hello"));
        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("To: reader@example.com"));
    }

    #[test]
    fn test_plain_text_message() {
        let mail = OutgoingMail::text("reader@example.com", "Bye", "You are unsubscribed.");

        let message = build_message(&sender(), &mail).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("text/plain"));
        assert!(!formatted.contains("multipart"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mail = OutgoingMail::text("not-an-address", "Hi", "Body");

        let result = build_message(&sender(), &mail);

        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn test_invalid_sender() {
        assert!(matches!(
            parse_mailbox("Weekly <nowhere>"),
            Err(MailError::InvalidAddress(_))
        ));
    }
}
