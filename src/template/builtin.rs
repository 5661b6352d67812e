//! Built-in notification templates.
//!
//! Every renderer produces a subject, an HTML body and a plain-text body from
//! the same data. Missing fields render as empty strings and optional
//! sections are left out.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::data::{
    AccountWelcome, EmailVerification, FileShareNotice, PasswordReset, StorageQuotaWarning,
    ACCOUNT_WELCOME, EMAIL_VERIFICATION, FILE_SHARE_NOTICE, PASSWORD_RESET,
    STORAGE_QUOTA_WARNING,
};
use super::{escape_html, RenderedMessage, TemplateData, TemplateRegistry};

/// A typed payload that knows how to render itself.
pub trait BuiltinTemplate: DeserializeOwned + Default + 'static {
    /// Registry key
    const NAME: &'static str;

    /// Borrow the payload when the data is this template's variant.
    fn extract(data: &TemplateData) -> Option<&Self>;

    fn render(&self, product: &str) -> RenderedMessage;
}

/// Register all five built-in templates under their stable names.
pub fn register_builtins(registry: &TemplateRegistry, product_name: &str) {
    let product: Arc<str> = Arc::from(product_name);

    register::<AccountWelcome>(registry, product.clone());
    register::<EmailVerification>(registry, product.clone());
    register::<PasswordReset>(registry, product.clone());
    register::<FileShareNotice>(registry, product.clone());
    register::<StorageQuotaWarning>(registry, product);
}

fn register<T: BuiltinTemplate>(registry: &TemplateRegistry, product: Arc<str>) {
    registry.register(T::NAME, move |data: &TemplateData| match T::extract(data) {
        Some(payload) => payload.render(&product),
        None => payload_from_custom::<T>(data).render(&product),
    });
}

/// Read a typed payload out of untyped data. Anything that does not fit
/// falls back to the all-defaults payload.
fn payload_from_custom<T: BuiltinTemplate>(data: &TemplateData) -> T {
    match data {
        TemplateData::Custom { values, .. } => {
            serde_json::from_value(Value::Object(values.clone())).unwrap_or_default()
        }
        _ => T::default(),
    }
}

impl BuiltinTemplate for AccountWelcome {
    const NAME: &'static str = ACCOUNT_WELCOME;

    fn extract(data: &TemplateData) -> Option<&Self> {
        match data {
            TemplateData::AccountWelcome(d) => Some(d),
            _ => None,
        }
    }

    fn render(&self, product: &str) -> RenderedMessage {
        let subject = format!("Welcome to {product}");
        let body = format!(
            "<p>{greeting}</p>\
             <p>Your {product} account is ready. Sign in to start uploading and sharing your files.</p>\
             {button}",
            greeting = escape_html(&greeting(&self.username)),
            product = escape_html(product),
            button = button(&self.login_url, "Sign in"),
        );

        let text = format!(
            "{greeting}\n\n\
             Your {product} account is ready. Sign in to start uploading and sharing your files:\n\
             {url}\n\n{footer}",
            greeting = greeting(&self.username),
            url = self.login_url,
            footer = text_footer(product),
        );

        RenderedMessage {
            html: layout(product, &subject, &body),
            subject,
            text: Some(text),
        }
    }
}

impl BuiltinTemplate for EmailVerification {
    const NAME: &'static str = EMAIL_VERIFICATION;

    fn extract(data: &TemplateData) -> Option<&Self> {
        match data {
            TemplateData::EmailVerification(d) => Some(d),
            _ => None,
        }
    }

    fn render(&self, product: &str) -> RenderedMessage {
        let subject = format!("Verify your email address for {product}");
        let body = format!(
            "<p>{greeting}</p>\
             <p>Please confirm that this is your email address.</p>\
             {button}\
             <p>This link expires in 24 hours. If you did not create an account, you can ignore this email.</p>",
            greeting = escape_html(&greeting(&self.username)),
            button = button(&self.verification_url, "Verify email"),
        );

        let text = format!(
            "{greeting}\n\n\
             Please confirm that this is your email address by opening the link below:\n\
             {url}\n\n\
             This link expires in 24 hours. If you did not create an account, you can ignore this email.\n\n\
             {footer}",
            greeting = greeting(&self.username),
            url = self.verification_url,
            footer = text_footer(product),
        );

        RenderedMessage {
            html: layout(product, &subject, &body),
            subject,
            text: Some(text),
        }
    }
}

impl BuiltinTemplate for PasswordReset {
    const NAME: &'static str = PASSWORD_RESET;

    fn extract(data: &TemplateData) -> Option<&Self> {
        match data {
            TemplateData::PasswordReset(d) => Some(d),
            _ => None,
        }
    }

    fn render(&self, product: &str) -> RenderedMessage {
        let subject = format!("Reset your {product} password");
        let body = format!(
            "<p>{greeting}</p>\
             <p>We received a request to reset your password.</p>\
             {button}\
             <p>This link expires in 1 hour. If you did not ask for a reset, your password stays unchanged.</p>",
            greeting = escape_html(&greeting(&self.username)),
            button = button(&self.reset_url, "Reset password"),
        );

        let text = format!(
            "{greeting}\n\n\
             We received a request to reset your password. Open the link below to choose a new one:\n\
             {url}\n\n\
             This link expires in 1 hour. If you did not ask for a reset, your password stays unchanged.\n\n\
             {footer}",
            greeting = greeting(&self.username),
            url = self.reset_url,
            footer = text_footer(product),
        );

        RenderedMessage {
            html: layout(product, &subject, &body),
            subject,
            text: Some(text),
        }
    }
}

impl BuiltinTemplate for FileShareNotice {
    const NAME: &'static str = FILE_SHARE_NOTICE;

    fn extract(data: &TemplateData) -> Option<&Self> {
        match data {
            TemplateData::FileShareNotice(d) => Some(d),
            _ => None,
        }
    }

    fn render(&self, product: &str) -> RenderedMessage {
        let sender = if self.sender_name.trim().is_empty() {
            "Someone"
        } else {
            self.sender_name.as_str()
        };

        let subject = format!("{sender} shared \"{}\" with you", self.file_name);

        let message = self
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        let message_html = message
            .map(|m| format!("<blockquote>{}</blockquote>", escape_html(m)))
            .unwrap_or_default();
        let message_text = message
            .map(|m| format!("Message from {sender}:\n\"{m}\"\n\n"))
            .unwrap_or_default();

        let body = format!(
            "<p>{greeting}</p>\
             <p>{sender} shared <strong>{file}</strong> with you on {product}.</p>\
             {message}\
             {button}",
            greeting = escape_html(&greeting(&self.recipient_name)),
            sender = escape_html(sender),
            file = escape_html(&self.file_name),
            product = escape_html(product),
            message = message_html,
            button = button(&self.share_url, "Open file"),
        );

        let text = format!(
            "{greeting}\n\n\
             {sender} shared \"{file}\" with you on {product}.\n\n\
             {message}\
             Open the file here:\n{url}\n\n{footer}",
            greeting = greeting(&self.recipient_name),
            file = self.file_name,
            message = message_text,
            url = self.share_url,
            footer = text_footer(product),
        );

        RenderedMessage {
            html: layout(product, &subject, &body),
            subject,
            text: Some(text),
        }
    }
}

impl BuiltinTemplate for StorageQuotaWarning {
    const NAME: &'static str = STORAGE_QUOTA_WARNING;

    fn extract(data: &TemplateData) -> Option<&Self> {
        match data {
            TemplateData::StorageQuotaWarning(d) => Some(d),
            _ => None,
        }
    }

    fn render(&self, product: &str) -> RenderedMessage {
        let used = format_percentage(self.used_percentage);
        let subject = format!("You have used {used} of your {product} storage");

        let body = format!(
            "<p>{greeting}</p>\
             <p>Your account is using <strong>{used}</strong> of its storage quota. \
             When it is full, new uploads will be rejected.</p>\
             {button}",
            greeting = escape_html(&greeting(&self.username)),
            button = button(&self.upgrade_url, "Upgrade storage"),
        );

        let text = format!(
            "{greeting}\n\n\
             Your account is using {used} of its storage quota. When it is full, new uploads will be rejected.\n\n\
             Upgrade your plan here:\n{url}\n\n{footer}",
            greeting = greeting(&self.username),
            url = self.upgrade_url,
            footer = text_footer(product),
        );

        RenderedMessage {
            html: layout(product, &subject, &body),
            subject,
            text: Some(text),
        }
    }
}

fn greeting(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        "Hi there,".to_string()
    } else {
        format!("Hi {name},")
    }
}

/// Whole numbers print without a fractional part (85 -> "85%").
fn format_percentage(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }

    if value.fract() == 0.0 {
        format!("{}%", value as i64)
    } else {
        let rounded = format!("{value:.1}");
        format!("{}%", rounded.trim_end_matches('0').trim_end_matches('.'))
    }
}

fn button(url: &str, label: &str) -> String {
    if url.trim().is_empty() {
        return String::new();
    }

    format!(
        "<p><a href=\"{url}\" style=\"display:inline-block;padding:10px 18px;\
         background:#2563eb;color:#ffffff;text-decoration:none;border-radius:4px\">{label}</a></p>\
         <p style=\"font-size:12px;color:#6b7280\">Or paste this link into your browser: {url}</p>",
        url = escape_html(url),
        label = escape_html(label),
    )
}

fn layout(product: &str, title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body style=\"font-family:Arial,sans-serif;color:#111827\">\
         <div style=\"max-width:560px;margin:0 auto;padding:24px\">\
         {body}\
         <hr style=\"border:none;border-top:1px solid #e5e7eb\">\
         <p style=\"font-size:12px;color:#6b7280\">Sent by {product}. This is an automated message.</p>\
         </div></body></html>",
        title = escape_html(title),
        product = escape_html(product),
    )
}

fn text_footer(product: &str) -> String {
    format!("-- \nSent by {product}. This is an automated message.")
}
