//! SMTP transport built on lettre.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::types::{
    Attachment, AttachmentSource, MailTransport, OutboundEmail, TransportConnector,
    TransportError,
};
use crate::config::SmtpConfig;

pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpTransport {
    /// Build the client. No connection is opened until the first send or
    /// verification.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, TransportError> {
        let host = config
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TransportError::Build("SMTP host is not set".to_string()))?;

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| TransportError::Build(e.to_string()))?;

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            host: host.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(&self, email: &OutboundEmail) -> Result<String, TransportError> {
        let message_id = new_message_id(&email.from.address);
        let message = build_message(email, &message_id).await?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| classify_smtp_error(&e))?;

        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), TransportError> {
        match self.mailer.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Connection(format!(
                "{} did not accept the connection",
                self.host
            ))),
            Err(e) => Err(TransportError::Connection(e.to_string())),
        }
    }
}

/// Builds `SmtpTransport` handles
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpConnector;

impl TransportConnector for SmtpConnector {
    fn connect(&self, config: &SmtpConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
        Ok(Arc::new(SmtpTransport::from_config(config)?))
    }
}

fn classify_smtp_error(error: &lettre::transport::smtp::Error) -> TransportError {
    if error.is_permanent() || error.is_transient() {
        TransportError::Rejected(error.to_string())
    } else {
        TransportError::Connection(error.to_string())
    }
}

fn new_message_id(from_address: &str) -> String {
    let domain = from_address
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");

    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}

fn parse_address(address: &str) -> Result<Address, TransportError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| TransportError::InvalidAddress(format!("{address}: {e}")))
}

async fn build_message(email: &OutboundEmail, message_id: &str) -> Result<Message, TransportError> {
    let from_name = Some(email.from.name.clone()).filter(|n| !n.trim().is_empty());
    let from = Mailbox::new(from_name, parse_address(&email.from.address)?);
    let to = Mailbox::new(None, parse_address(&email.to)?);

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .message_id(Some(message_id.to_string()));

    let body = body_part(email);

    let message = if email.attachments.is_empty() {
        builder.multipart(body)
    } else {
        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &email.attachments {
            mixed = mixed.singlepart(attachment_part(attachment).await?);
        }
        builder.multipart(mixed)
    };

    message.map_err(|e| TransportError::Build(e.to_string()))
}

fn body_part(email: &OutboundEmail) -> MultiPart {
    match (&email.html, &email.text) {
        (Some(html), Some(text)) => MultiPart::alternative_plain_html(text.clone(), html.clone()),
        (Some(html), None) => MultiPart::alternative().singlepart(SinglePart::html(html.clone())),
        (None, Some(text)) => MultiPart::alternative().singlepart(SinglePart::plain(text.clone())),
        (None, None) => MultiPart::alternative().singlepart(SinglePart::plain(String::new())),
    }
}

async fn attachment_part(attachment: &Attachment) -> Result<SinglePart, TransportError> {
    let body = match &attachment.source {
        AttachmentSource::Content(content) => content.clone().into_bytes(),
        AttachmentSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
            TransportError::Attachment(format!("{}: {}", path.display(), e))
        })?,
    };

    let content_type = ContentType::parse(attachment.content_type_or_default()).map_err(|e| {
        TransportError::Attachment(format!("{}: {}", attachment.filename, e))
    })?;

    Ok(MailAttachment::new(attachment.filename.clone()).body(body, content_type))
}
