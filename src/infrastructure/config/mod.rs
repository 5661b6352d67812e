mod settings;

pub use settings::{
    ApiConfig, LoggingConfig, QueueConfig, RedisConfig, ServerConfig, Settings, SmtpConfig,
    TemplateConfig, WorkerConfig,
};
