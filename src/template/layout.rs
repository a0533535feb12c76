//! Responsive single-column email layout and its building blocks.
//!
//! The layout is one embedded minijinja template rendered without
//! auto-escape. Dynamic text goes through the `escape_text` filter; row
//! values arrive as already-safe HTML (see [`RowValue`]).

use super::text::escape_html;
use super::theme::Theme;
use crate::error::TemplateError;
use minijinja::{Environment, context};
use serde::Serialize;

/// Placeholder shown for empty row values.
pub const EMPTY_VALUE: &str = "—";

const LAYOUT_TEMPLATE: &str = r##"
<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta http-equiv="x-ua-compatible" content="ie=edge">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title | escape_text }}</title>
  <style>
    body, table, td, a { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, 'Apple Color Emoji','Segoe UI Emoji', 'Segoe UI Symbol'; }
    img { border:0; outline:none; text-decoration:none; }
    table { border-collapse:collapse !important; }
    body { margin:0 !important; padding:0 !important; background:{{ theme.bg }}; color:{{ theme.text }}; }
    a { text-decoration:none; }
    @media only screen and (max-width: 600px) {
      .container { width: 100% !important; border-radius: 0 !important; }
      .px-24 { padding-left:16px !important; padding-right:16px !important; }
    }
    @media (prefers-color-scheme: dark) {
      body { background:#0b0f14 !important; color:#e5e7eb !important; }
      .card { background:#121821 !important; border-color:#1f2937 !important; }
      .muted { color:#9ca3af !important; }
      .brand { background:#4338CA !important; }
    }
  </style>
</head>
<body>
  <div style="display:none; max-height:0; overflow:hidden; opacity:0; color:transparent; line-height:1px; height:0;">
    {{ preview | escape_text }}
  </div>

  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" border="0">
    <tr>
      <td align="center" style="padding:24px;">
        <table role="presentation" width="600" class="container" cellspacing="0" cellpadding="0" border="0" style="width:600px; max-width:600px;">
          <!-- Header / Brand -->
          <tr>
            <td class="px-24" style="padding:0 24px 16px 24px;">
              <table role="presentation" width="100%">
                <tr>
                  <td align="left" style="padding:8px 0 0 0;">
                    <div class="brand" style="display:inline-block; background:{{ theme.brand_color }}; color:{{ theme.brand_text_color }}; padding:10px 14px; border-radius:12px; font-weight:700; font-size:14px; letter-spacing:0.3px;">{{ theme.brand_name | escape_text }}</div>
                  </td>
                </tr>
              </table>
            </td>
          </tr>

          <!-- Card -->
          <tr>
            <td class="px-24" style="padding:0 24px 24px 24px;">
              <table role="presentation" width="100%" class="card" style="background:{{ theme.card_bg }}; border:1px solid {{ theme.border }}; border-radius:16px; box-shadow:0 6px 20px rgba(17, 24, 39, 0.08);">
                <tr>
                  <td style="padding:24px 24px 8px 24px;">
                    <h1 style="margin:0; font-size:20px; line-height:28px;">{{ title | escape_text }}</h1>
                    <p class="muted" style="margin:8px 0 0 0; font-size:14px; color:{{ theme.muted }};">{{ lead | escape_text }}</p>
                  </td>
                </tr>
{% if before_rows %}
{{ before_rows }}
{% endif %}
                <tr>
                  <td style="padding:8px 24px 8px 24px;">
                    <table role="presentation" width="100%" cellspacing="0" cellpadding="0" border="0">
{% for row in rows %}
                      <tr>
                        <td style="width:160px; vertical-align:top; padding:10px 12px; font-size:14px; font-weight:600; border-bottom:1px solid {{ theme.border }};">{{ row.label | escape_text }}</td>
                        <td style="vertical-align:top; padding:10px 12px; font-size:14px; border-bottom:1px solid {{ theme.border }}; word-break:break-word;">{{ row.value }}</td>
                      </tr>
{% endfor %}
                    </table>
                  </td>
                </tr>
{% if extra %}
                <tr>
                  <td style="padding:8px 24px 24px 24px;">
                    {{ extra }}
                  </td>
                </tr>
{% endif %}
                <tr>
                  <td style="padding:0 24px 20px 24px;">
                    <hr style="border:none; border-top:1px solid {{ theme.border }}; margin:0;">
                  </td>
                </tr>

                <tr>
                  <td style="padding:0 24px 24px 24px;">
                    <p class="muted" style="margin:0; font-size:12px; color:{{ theme.muted }};">
                      You’re receiving this because you enabled email {{ channels | escape_text }} in {{ app_name | escape_text }}.
                    </p>
                  </td>
                </tr>
              </table>
            </td>
          </tr>

          <!-- Footer -->
          <tr>
            <td class="px-24" align="center" style="padding:0 24px 24px 24px;">
              <p class="muted" style="margin:0; font-size:12px; color:{{ theme.muted }};">
                © {{ year }} {{ app_name | escape_text }}. All rights reserved.
              </p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>
"##;

/// Which channels are enabled, named in the footer disclaimer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Channels {
    pub alert: bool,
    pub notify: bool,
}

impl Channels {
    /// `alerts`, `notifications`, `alerts and notifications`, or empty.
    pub fn describe(&self) -> &'static str {
        match (self.alert, self.notify) {
            (true, true) => "alerts and notifications",
            (true, false) => "alerts",
            (false, true) => "notifications",
            (false, false) => "",
        }
    }
}

/// Value cell of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    /// Caller-supplied text; escaped before insertion.
    Text(Option<String>),
    /// Markup built by this crate (links); inserted as is.
    Markup(String),
}

impl RowValue {
    pub fn to_html(&self) -> String {
        match self {
            RowValue::Text(Some(text)) if !text.is_empty() => escape_html(text),
            RowValue::Markup(markup) if !markup.is_empty() => markup.clone(),
            _ => EMPTY_VALUE.to_string(),
        }
    }
}

/// One labeled line of the details table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub value: RowValue,
}

impl Row {
    pub fn text(label: &str, value: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            value: RowValue::Text(value.map(str::to_string)),
        }
    }

    pub fn markup(label: &str, markup: String) -> Self {
        Self {
            label: label.to_string(),
            value: RowValue::Markup(markup),
        }
    }
}

/// View model of a single email.
#[derive(Debug, Clone, Default)]
pub struct EmailLayout {
    pub title: String,
    pub preview: String,
    pub lead: String,
    pub rows: Vec<Row>,
    /// Inserted between the lead and the rows (e.g. the alert badge).
    pub before_rows: Option<String>,
    /// Inserted after the rows (e.g. the call-to-action button).
    pub extra: Option<String>,
}

/// Everything around the card that does not depend on the event.
#[derive(Debug, Clone, Copy)]
pub struct LayoutChrome<'a> {
    pub theme: &'a Theme,
    pub channels: Channels,
    pub year: i32,
}

#[derive(Serialize)]
struct RowView {
    label: String,
    value: String,
}

/// Environment with the `escape_text` filter registered.
pub fn layout_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_filter("escape_text", |value: String| escape_html(&value));
    env
}

/// Render a layout to a complete HTML document.
pub fn render_layout(
    env: &Environment<'static>,
    layout: &EmailLayout,
    chrome: &LayoutChrome<'_>,
) -> Result<String, TemplateError> {
    let rows: Vec<RowView> = layout
        .rows
        .iter()
        .map(|row| RowView {
            label: row.label.clone(),
            value: row.value.to_html(),
        })
        .collect();

    env.render_str(
        LAYOUT_TEMPLATE,
        context! {
            title => &layout.title,
            preview => &layout.preview,
            lead => &layout.lead,
            rows => rows,
            before_rows => &layout.before_rows,
            extra => &layout.extra,
            theme => chrome.theme,
            channels => chrome.channels.describe(),
            app_name => &chrome.theme.brand_name,
            year => chrome.year,
        },
    )
    .map_err(|e| TemplateError::RenderFailed {
        message: e.to_string(),
    })
}

/// Escape a value placed inside a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

/// Inline link styled with the brand color.
pub fn link(href: &str, text: &str, theme: &Theme) -> String {
    let text = if text.is_empty() { href } else { text };
    format!(
        r#"<a href="{}" style="color:{}; text-decoration:underline;">{}</a>"#,
        escape_attr(href),
        theme.brand_color,
        escape_html(text)
    )
}

/// Call-to-action button block.
pub fn cta_button(text: &str, href: &str, theme: &Theme) -> String {
    format!(
        r#"<table role="presentation" cellspacing="0" cellpadding="0" border="0">
  <tr>
    <td align="left">
      <a href="{href}"
         style="display:inline-block; padding:12px 18px; font-weight:700; font-size:14px; border-radius:10px; background:{bg}; color:{fg};">
        {text}
      </a>
    </td>
  </tr>
</table>"#,
        href = escape_attr(href),
        bg = theme.brand_color,
        fg = theme.brand_text_color,
        text = escape_html(text),
    )
}

/// Red "ALERT" pill shown above the rows of alert emails.
pub fn alert_badge() -> String {
    r#"<tr>
  <td style="padding:0 0 16px 0;">
    <div style="display:inline-block; background:#FEE2E2; color:#B91C1C; font-weight:600; padding:6px 10px; border-radius:999px; font-size:12px;">ALERT</div>
  </td>
</tr>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome(theme: &Theme) -> LayoutChrome<'_> {
        LayoutChrome {
            theme,
            channels: Channels {
                alert: true,
                notify: false,
            },
            year: 2031,
        }
    }

    fn sample_layout() -> EmailLayout {
        EmailLayout {
            title: "Title <1>".to_string(),
            preview: "Preview & more".to_string(),
            lead: "Lead".to_string(),
            rows: vec![
                Row::text("User <label>", Some("Ann")),
                Row::text("OS", None),
            ],
            before_rows: None,
            extra: None,
        }
    }

    #[test]
    fn channels_describe_all_combinations() {
        let describe = |alert, notify| Channels { alert, notify }.describe();
        assert_eq!(describe(true, true), "alerts and notifications");
        assert_eq!(describe(true, false), "alerts");
        assert_eq!(describe(false, true), "notifications");
        assert_eq!(describe(false, false), "");
    }

    #[test]
    fn row_value_escapes_text_and_keeps_markup() {
        assert_eq!(
            RowValue::Text(Some("<i>x</i>".to_string())).to_html(),
            "&lt;i&gt;x&lt;/i&gt;"
        );
        assert_eq!(
            RowValue::Markup("<a href=\"u\">u</a>".to_string()).to_html(),
            "<a href=\"u\">u</a>"
        );
    }

    #[test]
    fn row_value_placeholder_for_empty_values() {
        assert_eq!(RowValue::Text(None).to_html(), EMPTY_VALUE);
        assert_eq!(RowValue::Text(Some(String::new())).to_html(), EMPTY_VALUE);
        assert_eq!(RowValue::Markup(String::new()).to_html(), EMPTY_VALUE);
    }

    #[test]
    fn render_layout_escapes_dynamic_text() {
        let theme = Theme::branded("A&B");
        let html = render_layout(&layout_environment(), &sample_layout(), &chrome(&theme)).unwrap();

        assert!(html.contains("Title &lt;1&gt;"));
        assert!(html.contains("Preview &amp; more"));
        assert!(html.contains("User &lt;label&gt;"));
        assert!(html.contains("A&amp;B"));
        assert!(!html.contains("Title <1>"));
    }

    #[test]
    fn render_layout_includes_footer_and_year() {
        let theme = Theme::branded("Acme");
        let html = render_layout(&layout_environment(), &sample_layout(), &chrome(&theme)).unwrap();

        assert!(html.contains("you enabled email alerts in Acme."));
        assert!(html.contains("© 2031 Acme. All rights reserved."));
        assert!(html.contains(&format!(">{}<", EMPTY_VALUE)));
    }

    #[test]
    fn render_layout_optional_blocks() {
        let theme = Theme::default();
        let env = layout_environment();

        let plain = render_layout(&env, &sample_layout(), &chrome(&theme)).unwrap();
        assert!(!plain.contains("ALERT"));
        assert!(!plain.contains("Open Room"));

        let mut layout = sample_layout();
        layout.before_rows = Some(alert_badge());
        layout.extra = Some(cta_button("Open Room", "https://x/join/1", &theme));
        let full = render_layout(&env, &layout, &chrome(&theme)).unwrap();
        assert!(full.contains(">ALERT</div>"));
        assert!(full.contains("Open Room"));
        assert!(full.contains(r#"href="https://x/join/1""#));
    }

    #[test]
    fn href_quotes_cannot_close_the_attribute() {
        let theme = Theme::default();
        let href = r#"https://x/join/1" onclick="x()"#;

        for html in [link(href, "", &theme), cta_button("Open Room", href, &theme)] {
            let anchor = html.find("<a ").unwrap();
            let open_tag = &html[anchor..anchor + html[anchor..].find('>').unwrap()];
            assert!(!open_tag.contains(r#"" onclick"#), "attribute closed early: {}", open_tag);
            assert!(open_tag.contains(r#"href="https://x/join/1&quot; onclick=&quot;x()&quot;""#));
        }
    }

    #[test]
    fn link_escapes_href_and_text() {
        let theme = Theme::default();
        let html = link("https://x/?a=1&b=2", "", &theme);
        assert!(html.starts_with(r#"<a href="https://x/?a=1&amp;b=2""#));
        assert!(html.ends_with(">https://x/?a=1&amp;b=2</a>"));
        assert!(html.contains(&theme.brand_color));
    }
}
