//! roommail - Transactional email notifications for rooms and system alerts.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use roommail::cli::{Cli, Command, LogFormat, PreviewPart, parse_payload};
use roommail::config::Config;
use roommail::notify::{Mailer, NotificationSettings};
use roommail::template::EmailRenderer;

/// Initialize the tracing subscriber with the specified log format.
///
/// - `LogFormat::Text`: Human-readable format for journalctl
/// - `LogFormat::Json`: Structured JSON format for log aggregation
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);
    roommail::register_metric_descriptions();

    info!(config_path = %cli.config.display(), "Loading configuration");

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Validate => validate(&config, &cli.config),
        Command::Preview {
            event,
            payload,
            part,
        } => preview(&config, &event, payload.as_deref(), part),
        Command::SendAlert { event, payload } => {
            let payload = parse_payload(payload.as_deref())?;
            dispatch(&config, move |mailer| mailer.send_email_alert(&event, &payload))
        }
        Command::SendNotification { event, to, payload } => {
            let payload = parse_payload(payload.as_deref())?;
            let notifications = NotificationSettings::email(to);
            dispatch(&config, move |mailer| {
                mailer.send_email_notifications(&event, &payload, &notifications)
            })
        }
    }
}

/// Validate mode: report every problem, print a summary when clean.
fn validate(config: &Config, path: &Path) -> Result<()> {
    info!("Validating configuration");
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Configuration validation error");
        }
        error!(
            error_count = errors.len(),
            "Configuration validation failed"
        );
        std::process::exit(1);
    }

    let settings = config.email_settings();
    let on_off = |enabled: bool| if enabled { "enabled" } else { "disabled" };

    println!("Configuration is valid: {}", path.display());
    println!("  App name: {}", config.app_name());
    println!("  Timezone: {}", config.timezone().name());
    println!(
        "  SMTP: {}:{} ({})",
        settings.host,
        settings.port,
        if settings.implicit_tls() {
            "implicit TLS"
        } else {
            "STARTTLS"
        }
    );
    println!(
        "  Alert channel: {} ({})",
        on_off(settings.alert_enabled),
        if settings.alert_ready() {
            "ready"
        } else {
            "incomplete"
        }
    );
    println!(
        "  Notify channel: {} ({})",
        on_off(settings.notify_enabled),
        if settings.notify_ready() {
            "ready"
        } else {
            "incomplete"
        }
    );
    Ok(())
}

fn preview(config: &Config, event: &str, payload: Option<&str>, part: PreviewPart) -> Result<()> {
    let payload = parse_payload(payload)?;
    let renderer = EmailRenderer::from_config(config);

    let Some(message) = renderer.render(event, &payload)? else {
        anyhow::bail!("unknown event '{}'", event);
    };

    match part {
        PreviewPart::Subject => println!("{}", message.subject),
        PreviewPart::Html => println!("{}", message.html),
        PreviewPart::Text => println!("{}", message.plain_text()),
    }
    Ok(())
}

/// Run one dispatch call inside a runtime and wait for the background send.
fn dispatch<F>(config: &Config, call: F) -> Result<()>
where
    F: FnOnce(&Mailer) -> bool,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mailer = Mailer::from_config(config)?;

        if !call(&mailer) {
            error!("Nothing was sent; check the configuration and the event");
            std::process::exit(1);
        }

        info!("Waiting for email delivery...");
        mailer.drain().await;
        info!("roommail done");
        Ok(())
    })
}
