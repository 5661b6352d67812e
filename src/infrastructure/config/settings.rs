use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::template::PlaceholderTemplate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

/// Outbound SMTP settings.
///
/// The transport is only considered configured when a host and both
/// credentials are present. Anything less starts the service with
/// notification delivery disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Implicit TLS (usually port 465). When false, STARTTLS is used.
    #[serde(default)]
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Per-command timeout applied by the SMTP client
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u64,
    /// Periodic re-verification interval. 0 keeps the one-shot probe.
    #[serde(default)]
    pub reverify_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// "memory" or "redis"
    #[serde(default = "default_queue_backend")]
    pub backend: String,
    /// Maximum pending jobs held by the memory backend
    #[serde(default = "default_queue_max_size")]
    pub max_size: usize,
    #[serde(default = "default_queue_redis_key")]
    pub redis_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Product name shown in built-in template subjects and footers
    #[serde(default = "default_product_name")]
    pub product_name: String,
    #[serde(default)]
    pub custom: Vec<PlaceholderTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024 // 10 MiB, attachments travel inline
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Ara".to_string()
}

fn default_from_address() -> String {
    "noreply@localhost".to_string()
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_queue_backend() -> String {
    "memory".to_string()
}

fn default_queue_max_size() -> usize {
    10_000
}

fn default_queue_redis_key() -> String {
    "ara:mail:jobs".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    3
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_product_name() -> String {
    "Ara".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("smtp.port", default_smtp_port())?
            .set_default("queue.backend", default_queue_backend())?
            .set_default("redis.url", default_redis_url())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SMTP__HOST, SMTP__FROM_ADDRESS, QUEUE__BACKEND, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl SmtpConfig {
    /// Host and credentials are all present and non-empty.
    pub fn is_configured(&self) -> bool {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        present(&self.host) && present(&self.user) && present(&self.password)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            secure: false,
            user: None,
            password: None,
            from_name: default_from_name(),
            from_address: default_from_address(),
            timeout_seconds: default_smtp_timeout(),
            reverify_interval_seconds: 0,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: default_queue_backend(),
            max_size: default_queue_max_size(),
            redis_key: default_queue_redis_key(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            custom: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}
