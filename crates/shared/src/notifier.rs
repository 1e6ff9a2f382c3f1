use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use crate::config::EmailSettings;

/// A fully addressed plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail, password: &str) -> Result<()>;
}

/// Authenticated SMTP submission over implicit TLS.
pub struct SmtpMailer {
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_settings(settings: &EmailSettings) -> Self {
        Self::new(settings.smtp_host.clone(), settings.smtp_port)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail, password: &str) -> Result<()> {
        let message = Message::builder()
            .from(mail.from.parse().context("Invalid sender address")?)
            .to(mail.to.parse().context("Invalid recipient address")?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .context("Failed to build email message")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .context("Failed to configure SMTP relay")?
            .port(self.port)
            .credentials(Credentials::new(mail.from.clone(), password.to_string()))
            .build();

        transport
            .send(message)
            .await
            .with_context(|| format!("Failed to send email via {}:{}", self.host, self.port))?;

        Ok(())
    }
}

pub struct Notifier {
    settings: EmailSettings,
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(settings: EmailSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Email `subject`/`body` to the operator. Does nothing when email is disabled.
    pub async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        if !self.settings.enabled {
            tracing::debug!(subject, "email disabled, skipping");
            return Ok(());
        }

        let (to, user, password) = self.settings.credentials()?;
        let mail = OutgoingMail {
            from: user.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        self.transport.send(&mail, password).await?;
        tracing::info!(to, subject, "email sent");
        Ok(())
    }
}
