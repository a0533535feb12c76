//! Colors and brand name used by the email layout.

use crate::config::DEFAULT_APP_NAME;
use serde::Serialize;

/// Styling constants for every rendered email.
///
/// Fixed at startup; only the brand name comes from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub brand_name: String,
    pub brand_color: String,
    pub brand_text_color: String,
    pub card_bg: String,
    pub bg: String,
    pub text: String,
    pub muted: String,
    pub border: String,
}

impl Theme {
    /// Default palette with the given brand name.
    pub fn branded(brand_name: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
            ..Self::default()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            brand_name: DEFAULT_APP_NAME.to_string(),
            brand_color: "#6C5CE7".to_string(),
            brand_text_color: "#ffffff".to_string(),
            card_bg: "#ffffff".to_string(),
            bg: "#F6F9FC".to_string(),
            text: "#111827".to_string(),
            muted: "#6B7280".to_string(),
            border: "#E5E7EB".to_string(),
        }
    }
}
