//! Configuration-declared templates with `{{variable}}` placeholders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{escape_html, RenderedMessage, TemplateData, TemplateError, TemplateResult};

/// A template declared in configuration (`templates.custom`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderTemplate {
    /// Registry key (alphanumeric, dash, underscore)
    pub name: String,

    pub subject: String,

    pub html: String,

    /// Plain-text body. When empty, no text part is rendered.
    #[serde(default)]
    pub text: String,
}

impl PlaceholderTemplate {
    pub fn validate(&self) -> TemplateResult<()> {
        if self.name.is_empty() || self.name.len() > 64 {
            return Err(TemplateError::InvalidTemplate(
                "Name must be 1-64 characters".to_string(),
            ));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidTemplate(
                "Name must contain only alphanumeric, dash, or underscore".to_string(),
            ));
        }

        if self.subject.trim().is_empty() {
            return Err(TemplateError::InvalidTemplate(format!(
                "Template '{}' has an empty subject",
                self.name
            )));
        }

        if self.html.trim().is_empty() {
            return Err(TemplateError::InvalidTemplate(format!(
                "Template '{}' has an empty html body",
                self.name
            )));
        }

        Ok(())
    }

    /// Fill the placeholders from the data's JSON form.
    pub fn render(&self, data: &TemplateData) -> RenderedMessage {
        let variables = match data.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let text = substitute(&self.text, &variables, false);

        RenderedMessage {
            subject: substitute(&self.subject, &variables, false),
            html: substitute(&self.html, &variables, true),
            text: (!text.is_empty()).then_some(text),
        }
    }
}

/// Replace every `{{key}}` in `template`. Keys missing from `variables`
/// become empty strings; an unterminated `{{` is kept literally.
pub fn substitute(template: &str, variables: &Map<String, Value>, escape: bool) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        let key = after_open[..end].trim();
        if let Some(value) = variables.get(key) {
            let replacement = value_to_string(value);
            if escape {
                result.push_str(&escape_html(&replacement));
            } else {
                result.push_str(&replacement);
            }
        }

        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // Arrays and objects keep their JSON representation
        _ => value.to_string(),
    }
}
