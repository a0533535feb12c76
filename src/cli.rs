//! Command-line interface for roommail using clap.
//!
//! Every subcommand reads the same configuration file given with `-c`.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::notify::EventPayload;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format for journalctl (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Part of a rendered email printed by `preview`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PreviewPart {
    #[default]
    Html,
    Text,
    Subject,
}

/// Transactional email notifications for rooms and system alerts.
#[derive(Parser, Debug)]
#[command(name = "roommail")]
#[command(version)]
#[command(about = "Transactional email notifications for rooms and system alerts")]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate configuration and exit.
    Validate,

    /// Render an event email and print it without sending.
    Preview {
        /// Event name: join, widget or alert.
        #[arg(long)]
        event: String,

        /// Event payload as a JSON object.
        #[arg(long)]
        payload: Option<String>,

        /// What to print.
        #[arg(long, value_enum, default_value_t = PreviewPart::Html)]
        part: PreviewPart,
    },

    /// Send an event through the alert channel to the configured recipient.
    SendAlert {
        /// Event name: join, widget or alert.
        #[arg(long)]
        event: String,

        /// Event payload as a JSON object.
        #[arg(long)]
        payload: Option<String>,
    },

    /// Send an event through the notify channel to the given recipient.
    SendNotification {
        /// Event name (only join is delivered).
        #[arg(long)]
        event: String,

        /// Recipient address.
        #[arg(long)]
        to: String,

        /// Event payload as a JSON object.
        #[arg(long)]
        payload: Option<String>,
    },
}

/// Parse the `--payload` argument; absent means an empty payload.
pub fn parse_payload(raw: Option<&str>) -> anyhow::Result<EventPayload> {
    match raw {
        Some(json) => serde_json::from_str(json).context("invalid --payload JSON"),
        None => Ok(EventPayload::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn cli_default_config_path() {
        let cli = Cli::try_parse_from(["roommail", "validate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(cli.command, Command::Validate));
    }

    #[test]
    fn cli_custom_config_path() {
        let cli = Cli::try_parse_from(["roommail", "-c", "/custom/path.yaml", "validate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/custom/path.yaml"));
    }

    #[test]
    fn cli_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["roommail", "validate", "--config", "/long/path.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/long/path.yaml"));
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["roommail"]).is_err());
    }

    #[test]
    fn cli_preview_arguments() {
        let cli = Cli::try_parse_from([
            "roommail",
            "preview",
            "--event",
            "join",
            "--payload",
            r#"{"room_id":"42"}"#,
            "--part",
            "text",
        ])
        .unwrap();
        match cli.command {
            Command::Preview {
                event,
                payload,
                part,
            } => {
                assert_eq!(event, "join");
                assert_eq!(payload.as_deref(), Some(r#"{"room_id":"42"}"#));
                assert_eq!(part, PreviewPart::Text);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn cli_send_notification_requires_recipient() {
        assert!(Cli::try_parse_from(["roommail", "send-notification", "--event", "join"]).is_err());

        let cli = Cli::try_parse_from([
            "roommail",
            "send-notification",
            "--event",
            "join",
            "--to",
            "user@example.com",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::SendNotification { ref to, .. } if to == "user@example.com"));
    }

    #[test]
    fn cli_send_alert_without_payload() {
        let cli = Cli::try_parse_from(["roommail", "send-alert", "--event", "alert"]).unwrap();
        assert!(matches!(cli.command, Command::SendAlert { payload: None, .. }));
    }

    #[test]
    fn cli_log_format_default() {
        let cli = Cli::try_parse_from(["roommail", "validate"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Text));
    }

    #[test]
    fn cli_log_format_json() {
        let cli = Cli::try_parse_from(["roommail", "--log-format", "json", "validate"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn cli_log_format_invalid_rejected() {
        let result = Cli::try_parse_from(["roommail", "--log-format", "invalid", "validate"]);
        assert!(result.is_err(), "Invalid log format should be rejected");
    }

    #[test]
    #[serial]
    fn cli_log_format_from_env() {
        temp_env::with_var("LOG_FORMAT", Some("json"), || {
            let cli = Cli::try_parse_from(["roommail", "validate"]).unwrap();
            assert!(matches!(cli.log_format, LogFormat::Json));
        });
    }

    #[test]
    #[serial]
    fn cli_log_format_flag_overrides_env() {
        temp_env::with_var("LOG_FORMAT", Some("json"), || {
            let cli =
                Cli::try_parse_from(["roommail", "--log-format", "text", "validate"]).unwrap();
            assert!(matches!(cli.log_format, LogFormat::Text));
        });
    }

    #[test]
    fn parse_payload_defaults_to_empty() {
        assert_eq!(parse_payload(None).unwrap(), EventPayload::default());
    }

    #[test]
    fn parse_payload_reads_json() {
        let payload = parse_payload(Some(r#"{"subject":"S","body":"B"}"#)).unwrap();
        assert_eq!(payload, EventPayload::alert("S", "B"));
    }

    #[test]
    fn parse_payload_rejects_invalid_json() {
        let err = parse_payload(Some("{not json")).unwrap_err();
        assert!(err.to_string().contains("--payload"));
    }
}
