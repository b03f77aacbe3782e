mod parsing;
mod settings;
mod types;

pub(crate) use types::{
    AiSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, Environment,
    GradingSettings, RedisSettings, RuntimeSettings, Settings, TelemetrySettings,
};
