//! Centralized error types for roommail using thiserror.
//!
//! None of these errors ever reach callers of the dispatch entry points:
//! the mailer logs them and reports a plain `bool` instead.

use thiserror::Error;

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors related to email template rendering.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// Errors related to building and sending an email.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid email address '{address}': {message}")]
    InvalidAddress { address: String, message: String },
    #[error("failed to build email: {0}")]
    BuildFailed(String),
    #[error("failed to send email: {0}")]
    SendFailed(String),
}
