use anyhow::{Result, bail};
use serde_json::Value;

use crate::domain::{
    repositories::notifications::TemplateRenderer,
    value_objects::enums::email_types::EmailType,
};

const TRIAL_ENDED_HTML: &str = r#"<!doctype html>
<html>
  <body style="font-family: sans-serif; color: #1f2933;">
    <p>Hi {{name}},</p>
    <p>Your free trial ended on <strong>{{trial_ended_at}}</strong>.</p>
    <p>
      We will keep monitoring your competitors for {{grace_period_days}} more days,
      until <strong>{{grace_ends_at}}</strong>. After that, price tracking stops.
    </p>
    <p><a href="{{upgrade_url}}">Choose a plan</a> to keep your data flowing.</p>
  </body>
</html>
"#;

const GRACE_PERIOD_ENDED_HTML: &str = r#"<!doctype html>
<html>
  <body style="font-family: sans-serif; color: #1f2933;">
    <p>Hi {{name}},</p>
    <p>Your grace period has ended and competitor monitoring is now paused.</p>
    <p>Your tracked competitors and price history are still here.</p>
    <p><a href="{{upgrade_url}}">Upgrade your account</a> to resume crawling.</p>
  </body>
</html>
"#;

/// Renders the lifecycle notification templates compiled into the binary.
#[derive(Debug, Default, Clone)]
pub struct BuiltinTemplateRenderer;

impl BuiltinTemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    fn source(template: EmailType) -> &'static str {
        match template {
            EmailType::TrialEnded => TRIAL_ENDED_HTML,
            EmailType::GracePeriodEnded => GRACE_PERIOD_ENDED_HTML,
        }
    }
}

impl TemplateRenderer for BuiltinTemplateRenderer {
    fn subject(&self, template: EmailType) -> String {
        match template {
            EmailType::TrialEnded => "Your free trial has ended".to_string(),
            EmailType::GracePeriodEnded => "Competitor monitoring is paused".to_string(),
        }
    }

    fn render(&self, template: EmailType, data: &Value) -> Result<String> {
        substitute(Self::source(template), data)
    }
}

/// Replaces every `{{key}}` with the escaped value of `data[key]`.
/// A placeholder without a value is an error rather than an empty hole.
fn substitute(source: &str, data: &Value) -> Result<String> {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            bail!("unterminated placeholder in template");
        };

        let key = after_open[..end].trim();
        let value = match data.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => bail!("missing template value: {key}"),
            Some(other) => other.to_string(),
        };
        output.push_str(&escape_html(&value));

        rest = &after_open[end + 2..];
    }

    output.push_str(rest);
    Ok(output)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_trial_ended_with_values() {
        let html = BuiltinTemplateRenderer::new()
            .render(
                EmailType::TrialEnded,
                &json!({
                    "name": "Dana",
                    "trial_ended_at": "2026-03-01",
                    "grace_period_days": 3,
                    "grace_ends_at": "2026-03-04",
                    "upgrade_url": "https://app.example.com/billing",
                }),
            )
            .unwrap();

        assert!(html.contains("Hi Dana,"));
        assert!(html.contains("for 3 more days"));
        assert!(html.contains("href=\"https://app.example.com/billing\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn escapes_user_supplied_values() {
        let html = substitute("<p>{{name}}</p>", &json!({ "name": "<b>Tom & \"Jerry\"</b>" }))
            .unwrap();

        assert_eq!(html, "<p>&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;</p>");
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = BuiltinTemplateRenderer::new()
            .render(EmailType::GracePeriodEnded, &json!({ "name": "Dana" }))
            .unwrap_err();

        assert!(err.to_string().contains("upgrade_url"));
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        assert!(substitute("Hello {{name", &json!({ "name": "x" })).is_err());
    }

    #[test]
    fn subjects_differ_per_template() {
        let renderer = BuiltinTemplateRenderer::new();
        assert_ne!(
            renderer.subject(EmailType::TrialEnded),
            renderer.subject(EmailType::GracePeriodEnded)
        );
    }
}
