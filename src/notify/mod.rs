//! Email dispatch for room and alert events.
//!
//! Two entry points share one background send primitive:
//! - [`Mailer::send_email_alert`]: alert channel, fixed recipient
//! - [`Mailer::send_email_notifications`]: notify channel, caller-supplied
//!   recipient
//!
//! Both gate on the resolved [`EmailSettings`], render synchronously and
//! return a `bool`. The SMTP exchange runs in a tracked tokio task; its
//! failures only reach the log and the metrics, never the caller.
//!
//! ```text
//! config/ -> EmailSettings -> Mailer -> template/ -> EmailTransport
//! ```

pub mod payload;
pub mod transport;

pub use payload::{EventPayload, NotificationMode, NotificationSettings, format_timestamp};
pub use transport::{EmailTransport, SmtpTransport, build_message, parse_mailbox};

use crate::config::{Config, EmailSettings};
use crate::error::NotifyError;
use crate::metrics::{EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL, EMAILS_SKIPPED_TOTAL};
use crate::template::{EmailRenderer, EventKind, RenderedMessage};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use validator::ValidateEmail;

/// Channel label used in logs and metrics.
const ALERT_CHANNEL: &str = "alert";
const NOTIFY_CHANNEL: &str = "notify";

/// Returns true if `address` is a syntactically valid email address.
pub fn is_valid_email(address: &str) -> bool {
    !address.is_empty() && address.validate_email()
}

/// Renders event emails and hands them to the transport in the background.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Mailer {
    settings: Arc<EmailSettings>,
    renderer: Arc<EmailRenderer>,
    transport: Arc<dyn EmailTransport>,
    tracker: TaskTracker,
}

impl Mailer {
    /// Create a mailer with an explicit transport.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = Arc::new(MockEmailTransport::new());
    /// let mailer = Mailer::new(settings, renderer, mock.clone());
    /// ```
    pub fn new(
        settings: EmailSettings,
        renderer: EmailRenderer,
        transport: Arc<dyn EmailTransport>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            renderer: Arc::new(renderer),
            transport,
            tracker: TaskTracker::new(),
        }
    }

    /// Create a mailer that sends through SMTP as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::BuildFailed`] if the SMTP transport cannot be
    /// built (invalid TLS parameters). An incomplete email section is not an
    /// error: the mailer is built and every dispatch is a no-op.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let settings = config.email_settings();
        let renderer = EmailRenderer::from_config(config);
        let transport = SmtpTransport::from_settings(&settings)?;
        Ok(Self::new(settings, renderer, Arc::new(transport)))
    }

    pub fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &EmailRenderer {
        &self.renderer
    }

    /// Send `event` to the configured alert recipient.
    ///
    /// Returns `false` without sending when the alert channel is disabled,
    /// the base SMTP config or the recipient is missing, the event is
    /// unknown, or no tokio runtime is running.
    pub fn send_email_alert(&self, event: &str, payload: &EventPayload) -> bool {
        if !self.settings.alert_ready() {
            skipped(ALERT_CHANNEL, "channel not configured");
            return false;
        }

        tracing::info!(event = %event, payload = ?payload, "Email alert requested");

        match self.render(event, payload) {
            Some(message) => self.send(ALERT_CHANNEL, message, None),
            None => {
                skipped(ALERT_CHANNEL, "no template");
                false
            }
        }
    }

    /// Send `event` to the recipient named in `notifications`.
    ///
    /// Only `join` is delivered on this path. The recipient must be a valid
    /// address; otherwise an error is logged and nothing is sent.
    pub fn send_email_notifications(
        &self,
        event: &str,
        payload: &EventPayload,
        notifications: &NotificationSettings,
    ) -> bool {
        if !self.settings.notify_ready() {
            skipped(NOTIFY_CHANNEL, "channel not configured");
            return false;
        }

        tracing::info!(
            event = %event,
            payload = ?payload,
            notifications = ?notifications,
            "Email notification requested"
        );

        if event.parse::<EventKind>() != Ok(EventKind::Join) {
            skipped(NOTIFY_CHANNEL, "event not delivered on notify path");
            return false;
        }

        let address = notifications.mode.email.as_deref().unwrap_or_default();
        if !is_valid_email(address) {
            tracing::error!(email = %address, "Invalid notification email");
            skipped(NOTIFY_CHANNEL, "invalid recipient");
            return false;
        }

        match self.render(event, payload) {
            Some(message) => self.send(NOTIFY_CHANNEL, message, Some(address)),
            None => false,
        }
    }

    /// Wait for every background send started so far.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of sends still in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    fn render(&self, event: &str, payload: &EventPayload) -> Option<RenderedMessage> {
        match self.renderer.render(event, payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(event = %event, error = %e, "Failed to render email");
                None
            }
        }
    }

    /// Spawn the SMTP exchange. `to` overrides the configured recipient.
    fn send(&self, channel: &'static str, message: RenderedMessage, to: Option<&str>) -> bool {
        let Ok(handle) = Handle::try_current() else {
            tracing::error!(
                channel = channel,
                subject = %message.subject,
                "No async runtime available, email dropped"
            );
            skipped(channel, "no runtime");
            return false;
        };

        let to = to.unwrap_or(&self.settings.send_to).to_string();
        let from = self.settings.from.clone();
        let transport = Arc::clone(&self.transport);

        self.tracker.spawn_on(
            async move {
                let result = match build_message(&from, &to, &message) {
                    Ok(email) => transport
                        .send_email(email)
                        .await
                        .map_err(NotifyError::SendFailed),
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        tracing::info!(
                            channel = channel,
                            to = %to,
                            subject = %message.subject,
                            "Email sent"
                        );
                        metrics::counter!(EMAILS_SENT_TOTAL, "channel" => channel)
                            .increment(1);
                    }
                    Err(e) => {
                        tracing::error!(
                            channel = channel,
                            to = %to,
                            subject = %message.subject,
                            error = %e,
                            "Failed to send email"
                        );
                        metrics::counter!(EMAILS_FAILED_TOTAL, "channel" => channel)
                            .increment(1);
                    }
                }
            },
            &handle,
        );

        true
    }
}

fn skipped(channel: &'static str, reason: &'static str) {
    tracing::debug!(channel = channel, reason = reason, "Email skipped");
    metrics::counter!(
        EMAILS_SKIPPED_TOTAL,
        "channel" => channel,
        "reason" => reason
    )
    .increment(1);
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Settings carry a redacted password; the transport is opaque.
        f.debug_struct("Mailer")
            .field("settings", &self.settings)
            .field("renderer", &self.renderer)
            .field("pending", &self.tracker.len())
            .finish()
    }
}
