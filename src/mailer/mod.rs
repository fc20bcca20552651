//! SMTP delivery for the rendered report.
//!
//! One multipart (text + HTML) message per run, relayed through the
//! configured SMTP host with STARTTLS and credentials. Delivery problems are
//! fatal: the error propagates and the run exits non-zero, leaving the next
//! scheduled run as the retry.

use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::report::recipients::Recipients;
use crate::report::render::ReportContent;

pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Send the report to the resolved recipients.
    pub async fn send_report(&self, recipients: &Recipients, content: &ReportContent) -> Result<()> {
        let email = self.build_message(recipients, content)?;
        self.transport()?.send(email).await?;

        tracing::info!(
            to = recipients.to.len(),
            cc = recipients.cc.len(),
            subject = %content.subject,
            "Report sent"
        );
        Ok(())
    }

    fn build_message(&self, recipients: &Recipients, content: &ReportContent) -> Result<Message> {
        let from_address = self
            .config
            .from_address
            .as_ref()
            .or(self.config.username.as_ref())
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from: Mailbox = format!("{} <{}>", self.config.from_name, from_address).parse()?;

        let mut builder = Message::builder().from(from).subject(content.subject.clone());
        for addr in &recipients.to {
            builder = builder.to(addr.parse()?);
        }
        for addr in &recipients.cc {
            builder = builder.cc(addr.parse()?);
        }

        // The envelope is derived from the To and CC headers, so the message
        // reaches the union of both lists.
        let email = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(content.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(content.html.clone()),
                ),
        )?;

        Ok(email)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let mailer = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        }
        .port(self.config.port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.username, &self.config.password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        Ok(mailer.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> Mailer {
        Mailer::new(SmtpConfig {
            username: Some("bot@example.com".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        })
    }

    fn content() -> ReportContent {
        ReportContent {
            subject: "Weekly Development Release Notes - March 15, 2024".to_string(),
            html: "<html><body>report</body></html>".to_string(),
            text: "report".to_string(),
        }
    }

    fn recipients() -> Recipients {
        Recipients {
            to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            cc: vec!["c@example.com".to_string()],
        }
    }

    #[test]
    fn test_build_message_headers_and_parts() {
        let message = mailer().build_message(&recipients(), &content()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("Weekly Digest"));
        assert!(raw.contains("<bot@example.com>"));
        assert!(raw.contains("To: a@example.com, b@example.com"));
        assert!(raw.contains("Cc: c@example.com"));
        assert!(raw.contains("Subject: Weekly Development Release Notes - March 15, 2024"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("Content-Type: text/html"));

        let envelope: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(|addr| addr.to_string())
            .collect();
        assert_eq!(
            envelope,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[test]
    fn test_build_message_without_from_fails() {
        let mailer = Mailer::new(SmtpConfig::default());
        let err = mailer.build_message(&recipients(), &content()).unwrap_err();
        assert!(err.to_string().contains("From address"));
    }

    #[test]
    fn test_explicit_from_address_wins_over_username() {
        let mailer = Mailer::new(SmtpConfig {
            username: Some("bot@example.com".to_string()),
            from_address: Some("updates@example.com".to_string()),
            ..Default::default()
        });
        let message = mailer.build_message(&recipients(), &content()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("<updates@example.com>"));
    }

    #[test]
    fn test_invalid_recipient_address_fails() {
        let bad = Recipients {
            to: vec!["not an address".to_string()],
            cc: Vec::new(),
        };
        assert!(mailer().build_message(&bad, &content()).is_err());
    }
}
