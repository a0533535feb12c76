//! Configuration loading and resolution for roommail.
//!
//! This module handles loading the YAML configuration file, coercing the
//! email integration section, and resolving environment variables for
//! SMTP credentials.

mod email;
mod env;
mod secret;
mod types;

// Re-exports publics
pub use email::{EmailConfig, EmailSettings};
pub use env::resolve_env_vars;
pub use secret::SecretString;
pub use types::{
    AppConfig, BrandConfig, Config, DEFAULT_APP_NAME, DEFAULT_CONFIG_PATH, DEFAULT_TIMEZONE,
    IntegrationsConfig, ListenConfig, LoggingConfig, ServerConfig, UiConfig,
};

#[cfg(test)]
mod tests;
