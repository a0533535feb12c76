//! Email rendering for room and alert events.
//!
//! Maps an event name and its payload to a subject and an HTML body.
//! Rendering is pure apart from reading the clock; use
//! [`EmailRenderer::render_at`] to pin the time.
//!
//! # Example
//!
//! ```ignore
//! use roommail::template::EmailRenderer;
//! use roommail::notify::EventPayload;
//!
//! let renderer = EmailRenderer::from_config(&config);
//! let payload = EventPayload { room_id: Some("42".into()), ..Default::default() };
//!
//! if let Some(msg) = renderer.render("join", &payload)? {
//!     println!("{}", msg.subject);
//! }
//! ```

mod layout;
mod text;
mod theme;

pub use layout::{
    Channels, EMPTY_VALUE, EmailLayout, LayoutChrome, Row, RowValue, alert_badge, cta_button,
    link, render_layout,
};
pub use text::{escape_html, html_to_text};
pub use theme::Theme;

use crate::config::Config;
use crate::error::TemplateError;
use crate::notify::payload::{EventPayload, format_timestamp};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use minijinja::Environment;
use std::str::FromStr;

/// Domains that get the listen port appended in join links.
const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Events the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A participant joined a room.
    Join,
    /// A user is waiting in a room through the embeddable widget.
    Widget,
    /// A system alert with a caller-provided subject and message.
    Alert,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Join => "join",
            EventKind::Widget => "widget",
            EventKind::Alert => "alert",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(EventKind::Join),
            "widget" => Ok(EventKind::Widget),
            "alert" => Ok(EventKind::Alert),
            other => Err(format!("unknown event '{}'", other)),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered email ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
}

impl RenderedMessage {
    /// Plain-text alternative derived from the HTML body.
    pub fn plain_text(&self) -> String {
        html_to_text(&self.html)
    }
}

/// Renders event emails with a fixed theme and application settings.
pub struct EmailRenderer {
    env: Environment<'static>,
    theme: Theme,
    channels: Channels,
    listen_port: Option<u16>,
    timezone: Tz,
}

impl EmailRenderer {
    pub fn new(theme: Theme, channels: Channels, listen_port: Option<u16>, timezone: Tz) -> Self {
        Self {
            env: layout::layout_environment(),
            theme,
            channels,
            listen_port,
            timezone,
        }
    }

    /// Build a renderer from the brand, listen port, timezone and channel
    /// flags found in `config`.
    pub fn from_config(config: &Config) -> Self {
        let email = &config.integrations.email;
        Self::new(
            Theme::branded(config.app_name()),
            Channels {
                alert: email.alert,
                notify: email.notify,
            },
            config.listen_port(),
            config.timezone(),
        )
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Render `event` at the current time.
    ///
    /// Returns `Ok(None)` for event names outside the known set.
    pub fn render(
        &self,
        event: &str,
        payload: &EventPayload,
    ) -> Result<Option<RenderedMessage>, TemplateError> {
        self.render_at(event, payload, Utc::now())
    }

    /// Render `event` as if the current time were `now`.
    pub fn render_at(
        &self,
        event: &str,
        payload: &EventPayload,
        now: DateTime<Utc>,
    ) -> Result<Option<RenderedMessage>, TemplateError> {
        match event.parse::<EventKind>() {
            Ok(kind) => self.render_kind(kind, payload, now).map(Some),
            Err(_) => {
                tracing::debug!(event = %event, "No template for event");
                Ok(None)
            }
        }
    }

    /// Render a known event kind.
    pub fn render_kind(
        &self,
        kind: EventKind,
        payload: &EventPayload,
        now: DateTime<Utc>,
    ) -> Result<RenderedMessage, TemplateError> {
        let (subject, html) = match kind {
            EventKind::Join => (self.join_subject(payload), self.room_body(payload, now)?),
            EventKind::Widget => (self.widget_subject(payload), self.room_body(payload, now)?),
            EventKind::Alert => (self.alert_subject(payload), self.alert_body(payload, now)?),
        };

        tracing::trace!(
            event = %kind,
            subject_len = subject.len(),
            html_len = html.len(),
            "Email rendered"
        );
        Ok(RenderedMessage { subject, html })
    }

    pub fn join_subject(&self, payload: &EventPayload) -> String {
        format!(
            "{} • New user joined room {}",
            self.theme.brand_name,
            escape_html(payload.room_id.as_deref().unwrap_or(""))
        )
    }

    pub fn widget_subject(&self, payload: &EventPayload) -> String {
        format!(
            "{} WIDGET • User waiting in room {}",
            self.theme.brand_name,
            escape_html(payload.room_id.as_deref().unwrap_or(""))
        )
    }

    pub fn alert_subject(&self, payload: &EventPayload) -> String {
        match payload.subject.as_deref() {
            Some(subject) if !subject.is_empty() => subject.to_string(),
            _ => format!("{} • Alert", self.theme.brand_name),
        }
    }

    /// Join link for the payload's room, if both domain and room id are set.
    pub fn join_url(&self, payload: &EventPayload) -> Option<String> {
        join_url(
            payload.domain.as_deref().unwrap_or(""),
            payload.room_id.as_deref().unwrap_or(""),
            self.listen_port,
        )
    }

    /// Body shared by `join` and `widget`.
    fn room_body(&self, payload: &EventPayload, now: DateTime<Utc>) -> Result<String, TemplateError> {
        let room_id = payload.room_id.as_deref().unwrap_or("");
        let peer_name = payload
            .peer_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("A user");
        let join_url = self.join_url(payload);

        let room = match &join_url {
            Some(url) => Row::markup("Room", link(url, url, &self.theme)),
            None => Row::text("Room", payload.room_id.as_deref()),
        };

        let layout = EmailLayout {
            title: "New participant joined".to_string(),
            preview: format!("{} joined room {}", peer_name, room_id),
            lead: "A new participant has joined your room.".to_string(),
            rows: vec![
                Row::text("User", payload.peer_name.as_deref()),
                Row::text("OS", payload.os.as_deref()),
                Row::text("Browser", payload.browser.as_deref()),
                room,
                Row::text("Date & Time", Some(&format_timestamp(now, self.timezone))),
            ],
            before_rows: None,
            extra: join_url.map(|url| cta_button("Open Room", &url, &self.theme)),
        };

        self.render_layout(&layout, now)
    }

    fn alert_body(&self, payload: &EventPayload, now: DateTime<Utc>) -> Result<String, TemplateError> {
        let layout = EmailLayout {
            title: "🚨 Alert notification".to_string(),
            preview: format!("System alert from {}", self.theme.brand_name),
            lead: "Please review the alert below.".to_string(),
            rows: vec![
                Row::text("Message", payload.body.as_deref()),
                Row::text("Date & Time", Some(&format_timestamp(now, self.timezone))),
            ],
            before_rows: Some(alert_badge()),
            extra: None,
        };

        self.render_layout(&layout, now)
    }

    fn render_layout(&self, layout: &EmailLayout, now: DateTime<Utc>) -> Result<String, TemplateError> {
        let chrome = LayoutChrome {
            theme: &self.theme,
            channels: self.channels,
            year: now.with_timezone(&self.timezone).year(),
        };
        render_layout(&self.env, layout, &chrome)
    }
}

impl std::fmt::Debug for EmailRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailRenderer")
            .field("brand", &self.theme.brand_name)
            .field("channels", &self.channels)
            .field("listen_port", &self.listen_port)
            .field("timezone", &self.timezone.name())
            .finish()
    }
}

/// Build `https://<domain>/join/<room_id>`.
///
/// Loopback domains (substring match) get `:<listen_port>` appended when a
/// port is configured. Returns `None` if `domain` or `room_id` is empty.
pub fn join_url(domain: &str, room_id: &str, listen_port: Option<u16>) -> Option<String> {
    if domain.is_empty() || room_id.is_empty() {
        return None;
    }

    let is_loopback = LOOPBACK_HOSTS.iter().any(|host| domain.contains(host));
    let host = match listen_port {
        Some(port) if is_loopback => format!("{}:{}", domain, port),
        _ => domain.to_string(),
    };

    Some(format!("https://{}/join/{}", host, room_id))
}
