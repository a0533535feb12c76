//! SMTP transport seam and message construction.
//!
//! - Production: `AsyncSmtpTransport<Tokio1Executor>` behind [`SmtpTransport`]
//! - Testing: any [`EmailTransport`] implementation (see the mock in tests)

use crate::config::EmailSettings;
use crate::error::NotifyError;
use crate::template::RenderedMessage;
use async_trait::async_trait;
use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Body, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Port on which the SMTP server expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Async email transport abstraction.
///
/// Lets tests inject a recording transport while production uses SMTP.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one message.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Accepted by the server
    /// * `Err(String)` - Error message describing the failure
    async fn send_email(&self, message: Message) -> Result<(), String>;
}

/// SMTP transport wrapper implementing `EmailTransport`.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { inner: transport }
    }

    /// Build the SMTP transport described by `settings`.
    ///
    /// Port 465 connects with implicit TLS; any other port starts in clear
    /// text and upgrades with STARTTLS when the server offers it.
    ///
    /// Building does not connect; it fails only if TLS parameters are invalid.
    pub fn from_settings(settings: &EmailSettings) -> Result<Self, NotifyError> {
        // Without a host nothing is ever dispatched.
        let tls = if settings.host.is_empty() {
            Tls::None
        } else {
            let tls_params = TlsParameters::new(settings.host.clone()).map_err(|e| {
                NotifyError::BuildFailed(format!("TLS configuration error: {}", e))
            })?;
            if settings.port == IMPLICIT_TLS_PORT {
                Tls::Wrapper(tls_params)
            } else {
                Tls::Opportunistic(tls_params)
            }
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.expose().to_string(),
            ))
            .build();

        Ok(Self::new(transport))
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send_email(&self, message: Message) -> Result<(), String> {
        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport").finish_non_exhaustive()
    }
}

/// Parse an address (`user@host` or `Name <user@host>`).
pub fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })
}

/// Build a multipart/alternative message with a plain-text part derived
/// from the HTML.
pub fn build_message(
    from: &str,
    to: &str,
    rendered: &RenderedMessage,
) -> Result<Message, NotifyError> {
    let from = parse_mailbox(from)?;
    let to = parse_mailbox(to)?;

    let text = SinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .body(readable_body(rendered.plain_text()));
    let html = SinglePart::builder()
        .header(ContentType::TEXT_HTML)
        .body(readable_body(rendered.html.clone()));

    Message::builder()
        .from(from)
        .to(to)
        .subject(rendered.subject.as_str())
        .multipart(MultiPart::alternative().singlepart(text).singlepart(html))
        .map_err(|e| NotifyError::BuildFailed(e.to_string()))
}

/// Prefer 8bit so the body stays human-readable on the wire; bodies with
/// overlong lines fall back to lettre's automatic encoding.
fn readable_body(content: String) -> Body {
    Body::new_with_encoding(content, ContentTransferEncoding::EightBit)
        .unwrap_or_else(|raw| Body::new(raw))
}
