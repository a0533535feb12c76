//! SMTP integration settings and their resolution into [`EmailSettings`].
//!
//! The raw section is deliberately forgiving: values coerce instead of
//! failing the whole document, and an incomplete section simply leaves
//! both channels disabled at dispatch time.

use super::env::resolve_env_vars;
use super::secret::SecretString;
use serde::{Deserialize, Deserializer};

/// Raw `integrations.email` section as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    /// Enables the alert channel.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub alert: bool,
    /// Enables the notify channel.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub notify: bool,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub host: Option<String>,
    /// Non-numeric values coerce to 0.
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Supports `${ENV_VAR}` substitution.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub username: Option<String>,
    /// Supports `${ENV_VAR}` substitution.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub from: Option<String>,
    /// Default recipient of the alert channel.
    #[serde(default, alias = "sendTo", deserialize_with = "deserialize_text")]
    pub send_to: Option<String>,
}

/// Scalar accepted wherever the config is lenient.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => false,
        Some(Loose::Bool(b)) => b,
        Some(Loose::Int(n)) => n != 0,
        Some(Loose::Float(f)) => f != 0.0 && !f.is_nan(),
        Some(Loose::Text(s)) => !s.is_empty(),
        Some(Loose::Other(_)) => true,
    })
}

pub(crate) fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Int(n)) => u16::try_from(n).unwrap_or(0),
        Some(Loose::Float(f)) => port_from_float(f),
        Some(Loose::Text(s)) => port_from_text(&s),
        _ => 0,
    })
}

fn port_from_float(f: f64) -> u16 {
    if f.fract() == 0.0 && (0.0..=65535.0).contains(&f) {
        f as u16
    } else {
        0
    }
}

/// Decimal, integral float (`"587.0"`) or `0x` hexadecimal text.
fn port_from_text(text: &str) -> u16 {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u16::from_str_radix(hex, 16).unwrap_or(0);
    }
    text.parse::<u16>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(port_from_float))
        .unwrap_or(0)
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(f)) => f.to_string(),
        Some(Loose::Bool(true)) => "true".to_string(),
        _ => return Ok(None),
    };
    let text = text.trim().to_string();
    Ok((!text.is_empty()).then_some(text))
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    // Passwords are not trimmed: surrounding spaces may be significant.
    let raw = match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(f)) => f.to_string(),
        _ => return Ok(None),
    };
    Ok((!raw.is_empty()).then(|| SecretString::new(raw)))
}

/// Resolved, immutable SMTP settings shared by every dispatch.
#[derive(Debug, Clone, Default)]
pub struct EmailSettings {
    pub alert_enabled: bool,
    pub notify_enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from: String,
    pub send_to: String,
}

impl EmailSettings {
    /// Resolve the raw section into settings.
    ///
    /// Never fails: a credential referencing an undefined environment variable
    /// is logged and treated as absent, which disables dispatch.
    /// Logs one summary line when the configuration is complete.
    pub fn resolve(config: &EmailConfig) -> Self {
        let username = config
            .username
            .as_deref()
            .and_then(|u| resolve_credential("username", u))
            .unwrap_or_default();
        let password = config
            .password
            .as_ref()
            .and_then(|p| resolve_credential("password", p.expose()))
            .map(SecretString::new)
            .unwrap_or_default();

        let host = config.host.clone().unwrap_or_default();
        let from = config
            .from
            .clone()
            .or_else(|| (!username.is_empty()).then(|| username.clone()))
            .unwrap_or_else(|| {
                format!(
                    "no-reply@{}",
                    config.host.as_deref().unwrap_or("localhost")
                )
            });

        let settings = Self {
            alert_enabled: config.alert,
            notify_enabled: config.notify,
            host,
            port: config.port,
            username,
            password,
            from,
            send_to: config.send_to.clone().unwrap_or_default(),
        };

        if settings.is_complete() {
            tracing::info!(
                alert = settings.alert_enabled,
                notify = settings.notify_enabled,
                host = %settings.host,
                port = settings.port,
                username = %settings.username,
                from = %settings.from,
                to = %settings.send_to,
                "Email integration configured"
            );
        }

        settings
    }

    /// Host, port, username and password are all present.
    pub fn has_base_config(&self) -> bool {
        !self.host.is_empty()
            && self.port != 0
            && !self.username.is_empty()
            && !self.password.is_empty()
    }

    /// At least one channel is enabled and every connection field, including
    /// the default recipient, is present.
    pub fn is_complete(&self) -> bool {
        (self.alert_enabled || self.notify_enabled)
            && self.has_base_config()
            && !self.send_to.is_empty()
    }

    /// The alert channel can dispatch.
    pub fn alert_ready(&self) -> bool {
        self.alert_enabled && self.has_base_config() && !self.send_to.is_empty()
    }

    /// The notify channel can dispatch (the recipient comes from the caller).
    pub fn notify_ready(&self) -> bool {
        self.notify_enabled && self.has_base_config()
    }

    /// Port 465 means implicit TLS; anything else upgrades via STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

fn resolve_credential(field: &str, raw: &str) -> Option<String> {
    match resolve_env_vars(raw) {
        Ok(value) if !value.is_empty() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(field = field, error = %e, "Email credential not resolved, channel disabled");
            None
        }
    }
}
