//! Core configuration types and loading.

use super::email::{EmailConfig, EmailSettings, deserialize_port};
use super::env::resolve_env_vars;
use crate::error::ConfigError;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/roommail/config.yaml";

/// Brand name used when `ui.brand.app.name` is missing or blank.
pub const DEFAULT_APP_NAME: &str = "Legatalk";

/// Timezone used for timestamps when `logging.timezone` is missing.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Main configuration structure. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub brand: BrandConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct BrandConfig {
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub name: Option<String>,
}

/// Settings of the web application that links are built for.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: ListenConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListenConfig {
    /// Appended to loopback domains in join links. 0 means unset.
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// IANA timezone for timestamps printed in emails (e.g. "Europe/Rome").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub email: EmailConfig,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read.
    /// Returns [`ConfigError::ValidationError`] if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse configuration from YAML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // An empty document is a valid, fully defaulted config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Brand name shown in subjects, headers and footers.
    pub fn app_name(&self) -> String {
        self.ui
            .brand
            .app
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_APP_NAME)
            .to_string()
    }

    /// Listen port of the web application, if configured.
    pub fn listen_port(&self) -> Option<u16> {
        (self.server.listen.port != 0).then_some(self.server.listen.port)
    }

    /// Timezone for email timestamps, falling back to UTC.
    pub fn timezone(&self) -> Tz {
        self.logging.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.logging.timezone, "Invalid timezone, falling back to UTC");
            chrono_tz::UTC
        })
    }

    /// Resolve the email section into immutable settings.
    pub fn email_settings(&self) -> EmailSettings {
        EmailSettings::resolve(&self.integrations.email)
    }

    /// Report problems that would silently disable or break delivery.
    ///
    /// The mailer never requires this to pass; it is meant for operators.
    ///
    /// # Errors
    /// Returns every problem found as a `ConfigError::ValidationError`.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        let email = &self.integrations.email;

        if self.logging.timezone.parse::<Tz>().is_err() {
            errors.push(ConfigError::ValidationError(format!(
                "logging.timezone '{}' is not a valid timezone",
                self.logging.timezone
            )));
        }

        if (email.alert || email.notify) && email.host.is_some() && email.port == 0 {
            errors.push(ConfigError::ValidationError(
                "integrations.email.port must be a port number between 1 and 65535".to_string(),
            ));
        }

        if let Some(username) = &email.username
            && let Err(e) = resolve_env_vars(username)
        {
            errors.push(ConfigError::ValidationError(format!(
                "integrations.email.username: {}",
                e
            )));
        }

        if let Some(password) = &email.password
            && let Err(e) = resolve_env_vars(password.expose())
        {
            errors.push(ConfigError::ValidationError(format!(
                "integrations.email.password: {}",
                e
            )));
        }

        for (field, value) in [("from", &email.from), ("send_to", &email.send_to)] {
            if let Some(address) = value
                && address.parse::<lettre::message::Mailbox>().is_err()
            {
                errors.push(ConfigError::ValidationError(format!(
                    "integrations.email.{} '{}' is not a valid email address",
                    field, address
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
