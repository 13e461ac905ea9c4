//! SMTP delivery of rendered digest pages.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use tracker::{DigestPage, DigestSink, SinkError};

use crate::error::MailerError;
use crate::renderer::DigestRenderer;

/// Timeout for each SMTP command, matching the HTTP timeout of the feed
/// requests. Delivery is never retried.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// TLS from the first byte (usually port 465).
    Implicit,
    /// Plain connection upgraded with `STARTTLS` (usually port 587).
    StartTls,
}

/// SMTP server and envelope settings.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Sends each digest page as one HTML mail.
pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    renderer: DigestRenderer,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpSink {
    /// Builds the transport and parses both addresses.
    ///
    /// No connection is opened until the first page is delivered.
    pub fn new(settings: SmtpSettings, renderer: DigestRenderer) -> Result<Self, MailerError> {
        let from = parse_mailbox(&settings.from)?;
        let to = parse_mailbox(&settings.to)?;

        let builder = match settings.security {
            SmtpSecurity::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            }
        };
        let transport = builder
            .port(settings.port)
            .timeout(Some(SMTP_TIMEOUT))
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        Ok(Self {
            transport,
            renderer,
            from,
            to,
        })
    }

    fn message(&self, page: &DigestPage, body: String) -> Result<Message, MailerError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.renderer.subject_for(page))
            .header(ContentType::TEXT_HTML)
            .body(body)?)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address.parse().map_err(|source| MailerError::Address {
        address: address.to_string(),
        source,
    })
}

#[async_trait]
impl DigestSink for SmtpSink {
    #[instrument(skip_all, fields(page = page.number, of = page.count))]
    async fn deliver(&self, page: &DigestPage) -> Result<(), SinkError> {
        let body = self.renderer.render(page)?;
        let bytes = body.len();
        let message = self.message(page, body)?;

        self.transport
            .send(message)
            .await
            .map_err(MailerError::from)?;

        info!(bytes, releases = page.release_count(), "mailed digest page");
        Ok(())
    }
}
