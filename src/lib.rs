// src/lib.rs
//! roommail - Transactional email notifications for rooms and system alerts.

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod template;

// Re-export commonly used types
pub use cli::LogFormat;
pub use config::{Config, EmailSettings};
pub use error::{ConfigError, NotifyError, TemplateError};
pub use metrics::register_metric_descriptions;
pub use notify::{
    EmailTransport, EventPayload, Mailer, NotificationSettings, SmtpTransport, is_valid_email,
};
pub use template::{EmailRenderer, EventKind, RenderedMessage, escape_html, html_to_text};
