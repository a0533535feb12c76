//! Event payloads handed to the mailer by the application.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

/// Free-form event data. Every field is optional; which ones matter depends
/// on the event (`peer_name`..`browser` for room events, `subject`/`body`
/// for alerts).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub peer_name: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl EventPayload {
    /// Payload of a system alert.
    pub fn alert(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            body: Some(body.into()),
            ..Self::default()
        }
    }
}

/// Per-room notification preferences supplied with notify-path events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub mode: NotificationMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationMode {
    /// Recipient of notify-path emails; validated before sending.
    #[serde(default)]
    pub email: Option<String>,
}

impl NotificationSettings {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            mode: NotificationMode {
                email: Some(address.into()),
            },
        }
    }
}

/// Format a timestamp the way the en-US locale prints dates, with
/// milliseconds appended: `10/16/2026, 3:04:05 PM:123`.
pub fn format_timestamp(now: DateTime<Utc>, timezone: Tz) -> String {
    let local = now.with_timezone(&timezone);
    format!(
        "{}:{:03}",
        local.format("%-m/%-d/%Y, %-I:%M:%S %p"),
        now.timestamp_subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(millis: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 15, 4, 5).unwrap()
            + chrono::Duration::milliseconds(i64::from(millis))
    }

    #[test]
    fn format_timestamp_utc() {
        assert_eq!(
            format_timestamp(instant(7), chrono_tz::UTC),
            "1/5/2026, 3:04:05 PM:007"
        );
    }

    #[test]
    fn format_timestamp_converts_timezone() {
        // January = CET (UTC+1)
        assert_eq!(
            format_timestamp(instant(123), chrono_tz::Europe::Paris),
            "1/5/2026, 4:04:05 PM:123"
        );
    }

    #[test]
    fn format_timestamp_morning_hours() {
        let morning = Utc.with_ymd_and_hms(2026, 11, 20, 0, 30, 0).unwrap();
        assert_eq!(
            format_timestamp(morning, chrono_tz::UTC),
            "11/20/2026, 12:30:00 AM:000"
        );
    }

    #[test]
    fn payload_deserializes_partial_json() {
        let payload: EventPayload =
            serde_json::from_str(r#"{"room_id": "42", "peer_name": "Ann"}"#).unwrap();
        assert_eq!(payload.room_id.as_deref(), Some("42"));
        assert_eq!(payload.peer_name.as_deref(), Some("Ann"));
        assert!(payload.domain.is_none());
    }

    #[test]
    fn notification_settings_deserialize_nested_email() {
        let settings: NotificationSettings =
            serde_json::from_str(r#"{"mode": {"email": "user@example.com"}}"#).unwrap();
        assert_eq!(settings.mode.email.as_deref(), Some("user@example.com"));

        let empty: NotificationSettings = serde_json::from_str("{}").unwrap();
        assert!(empty.mode.email.is_none());
    }
}
