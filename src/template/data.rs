//! Typed template payloads.
//!
//! Each built-in template has its own data shape. `TemplateData` carries one
//! of them, or an open value map for templates registered outside the
//! built-in set. The variant decides which registry entry renders it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ACCOUNT_WELCOME: &str = "account-welcome";
pub const EMAIL_VERIFICATION: &str = "email-verification";
pub const PASSWORD_RESET: &str = "password-reset";
pub const FILE_SHARE_NOTICE: &str = "file-share-notice";
pub const STORAGE_QUOTA_WARNING: &str = "storage-quota-warning";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountWelcome {
    pub username: String,
    #[serde(alias = "loginUrl")]
    pub login_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailVerification {
    pub username: String,
    #[serde(alias = "verificationUrl")]
    pub verification_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordReset {
    pub username: String,
    #[serde(alias = "resetUrl")]
    pub reset_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileShareNotice {
    #[serde(alias = "recipientName")]
    pub recipient_name: String,
    #[serde(alias = "senderName")]
    pub sender_name: String,
    #[serde(alias = "fileName")]
    pub file_name: String,
    #[serde(alias = "shareUrl")]
    pub share_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageQuotaWarning {
    pub username: String,
    #[serde(alias = "usedPercentage")]
    pub used_percentage: f64,
    #[serde(alias = "upgradeUrl")]
    pub upgrade_url: String,
}

/// Data handed to a template renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateData {
    AccountWelcome(AccountWelcome),
    EmailVerification(EmailVerification),
    PasswordReset(PasswordReset),
    FileShareNotice(FileShareNotice),
    StorageQuotaWarning(StorageQuotaWarning),
    Custom {
        name: String,
        values: Map<String, Value>,
    },
}

impl TemplateData {
    /// Registry key this data renders under.
    pub fn name(&self) -> &str {
        match self {
            Self::AccountWelcome(_) => ACCOUNT_WELCOME,
            Self::EmailVerification(_) => EMAIL_VERIFICATION,
            Self::PasswordReset(_) => PASSWORD_RESET,
            Self::FileShareNotice(_) => FILE_SHARE_NOTICE,
            Self::StorageQuotaWarning(_) => STORAGE_QUOTA_WARNING,
            Self::Custom { name, .. } => name,
        }
    }

    /// Open-ended data for a template outside the built-in set.
    /// Anything other than a JSON object becomes an empty map.
    pub fn custom(name: impl Into<String>, values: Value) -> Self {
        let values = match values {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::Custom {
            name: name.into(),
            values,
        }
    }

    /// Rebuild typed data from a template name and a JSON object, as received
    /// over HTTP or read back from a queued job.
    ///
    /// Built-in names get their typed payload with missing fields defaulted.
    /// A payload that does not fit the built-in shape, or an unknown name,
    /// is kept as `Custom`.
    pub fn from_parts(name: &str, value: Value) -> Self {
        let value = if value.is_null() {
            Value::Object(Map::new())
        } else {
            value
        };

        let typed = match name {
            ACCOUNT_WELCOME => serde_json::from_value(value.clone()).map(Self::AccountWelcome),
            EMAIL_VERIFICATION => {
                serde_json::from_value(value.clone()).map(Self::EmailVerification)
            }
            PASSWORD_RESET => serde_json::from_value(value.clone()).map(Self::PasswordReset),
            FILE_SHARE_NOTICE => serde_json::from_value(value.clone()).map(Self::FileShareNotice),
            STORAGE_QUOTA_WARNING => {
                serde_json::from_value(value.clone()).map(Self::StorageQuotaWarning)
            }
            _ => return Self::custom(name, value),
        };

        typed.unwrap_or_else(|e| {
            tracing::debug!(
                template = %name,
                error = %e,
                "Template data does not match the built-in shape, keeping it untyped"
            );
            Self::custom(name, value)
        })
    }

    /// JSON object form of the data (the inverse of `from_parts`).
    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::AccountWelcome(d) => serde_json::to_value(d),
            Self::EmailVerification(d) => serde_json::to_value(d),
            Self::PasswordReset(d) => serde_json::to_value(d),
            Self::FileShareNotice(d) => serde_json::to_value(d),
            Self::StorageQuotaWarning(d) => serde_json::to_value(d),
            Self::Custom { values, .. } => return Value::Object(values.clone()),
        };

        // Plain structs of strings and numbers always serialize
        value.unwrap_or_else(|_| Value::Object(Map::new()))
    }
}
