//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::{OverflowPolicy, ProducerConfig, RealtimeConfig};

use crate::error::AppError;

/// Minimum accepted length of the JWT signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `AIENGINES__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time WebSocket hub settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// (`config/{env}.toml`) and environment variables prefixed with
    /// `AIENGINES__` (e.g. `AIENGINES__SERVER__PORT=3001`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AIENGINES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        tracing::debug!(env = %env, "Configuration loaded");
        Ok(loaded)
    }

    /// Checks cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} characters"
            )));
        }
        if self.realtime.outbound_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.outbound_buffer_size must be greater than zero",
            ));
        }
        if self.realtime.producers.agent_status_interval_seconds == 0
            || self.realtime.producers.task_progress_interval_seconds == 0
        {
            return Err(AppError::configuration(
                "realtime producer intervals must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn from_toml(raw: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg = from_toml(
            r#"
            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            "#,
        );
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.realtime.outbound_buffer_size, 256);
        assert_eq!(cfg.realtime.overflow_policy, OverflowPolicy::Disconnect);
        assert_eq!(cfg.realtime.max_connections_per_user, 0);
        assert_eq!(cfg.realtime.producers.agent_status_interval_seconds, 10);
        assert_eq!(cfg.realtime.producers.task_progress_interval_seconds, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_overflow_policy_parses_snake_case() {
        let cfg = from_toml(
            r#"
            [realtime]
            overflow_policy = "drop_oldest"
            outbound_buffer_size = 8
            "#,
        );
        assert_eq!(cfg.realtime.overflow_policy, OverflowPolicy::DropOldest);
        assert_eq!(cfg.realtime.outbound_buffer_size, 8);
    }

    #[test]
    fn test_short_secret_rejected() {
        let cfg = AppConfig::default();
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "x".repeat(MIN_JWT_SECRET_LEN);
        cfg.realtime.outbound_buffer_size = 0;
        assert!(cfg.validate().is_err());
    }
}
