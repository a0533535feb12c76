//! Metric descriptions for the email dispatcher.
//!
//! roommail only emits through the `metrics` facade; the embedding
//! application installs whatever recorder it exposes.

/// Counter incremented once per message accepted by the SMTP server.
pub const EMAILS_SENT_TOTAL: &str = "roommail_emails_sent_total";
/// Counter incremented once per message that failed to build or send.
pub const EMAILS_FAILED_TOTAL: &str = "roommail_emails_failed_total";
/// Counter incremented when a dispatch call is gated off.
pub const EMAILS_SKIPPED_TOTAL: &str = "roommail_emails_skipped_total";

/// Register all metric descriptions.
///
/// Call once at startup after the recorder is installed.
pub fn register_metric_descriptions() {
    use metrics::describe_counter;

    describe_counter!(
        EMAILS_SENT_TOTAL,
        "Total number of emails accepted by the SMTP server, by channel"
    );
    describe_counter!(
        EMAILS_FAILED_TOTAL,
        "Total number of emails that failed to build or send, by channel"
    );
    describe_counter!(
        EMAILS_SKIPPED_TOTAL,
        "Total number of dispatch calls that sent nothing, by channel and reason"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_without_recorder_is_noop() {
        register_metric_descriptions();
        register_metric_descriptions();
    }

    #[test]
    fn metric_names_share_prefix() {
        for name in [EMAILS_SENT_TOTAL, EMAILS_FAILED_TOTAL, EMAILS_SKIPPED_TOTAL] {
            assert!(name.starts_with("roommail_emails_"));
            assert!(name.ends_with("_total"));
        }
    }
}
