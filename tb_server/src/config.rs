//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{net::SocketAddr, time::Duration};
use table_booking::{
    db::DatabaseConfig,
    discord::DiscordConfig,
    notify::{DEFAULT_TIME_ZONE, DEFAULT_TTL, NotifyConfig},
};

/// Bind address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: &str = "127.0.0.1:9090";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Discord application credentials and guild
    pub discord: DiscordConfig,
    /// Announcement channel and display zone
    pub notify: NotifyConfig,
    /// Members holding this role may accept and refuse bookings
    pub admin_role_id: String,
    /// Lifetime of cached Discord lookups
    pub cache_ttl: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        Self::from_vars(|key| std::env::var(key).ok(), bind_override, database)
    }

    /// Build the configuration from an arbitrary variable source
    fn from_vars(
        var: impl Fn(&str) -> Option<String>,
        bind_override: Option<SocketAddr>,
        database: DatabaseConfig,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw = var("SERVER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?
            }
        };

        let required = |key: &str, hint: &str| {
            var(key).ok_or_else(|| ConfigError::MissingRequired {
                var: key.to_string(),
                hint: hint.to_string(),
            })
        };

        // Discord configuration (bot token, guild and channel are REQUIRED)
        let discord = DiscordConfig {
            bot_token: required("DISCORD_BOT_TOKEN", "Bot token from the Discord developer portal")?,
            guild_id: required("DISCORD_SERVER_ID", "Right-click the server > Copy Server ID")?,
            client_id: var("DISCORD_CLIENT_ID").unwrap_or_default(),
            client_secret: var("DISCORD_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: var("DISCORD_REDIRECT_URI").unwrap_or_default(),
            ..DiscordConfig::default()
        };

        let notify = NotifyConfig {
            channel_id: required("DISCORD_CHANNEL_ID", "Right-click the channel > Copy Channel ID")?,
            time_zone: var("BOOKING_TIME_ZONE").unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string()),
        };

        let cache_ttl = match var("DISCORD_CACHE_TTL_SECS") {
            Some(raw) => raw
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    var: "DISCORD_CACHE_TTL_SECS".to_string(),
                    reason: format!("'{raw}' is not a number of seconds"),
                })?,
            None => DEFAULT_TTL,
        };

        Ok(ServerConfig {
            bind,
            database,
            discord,
            notify,
            admin_role_id: var("DISCORD_ADMIN_ROLE_ID").unwrap_or_default(),
            cache_ttl,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("DISCORD_BOT_TOKEN", &self.discord.bot_token),
            ("DISCORD_SERVER_ID", &self.discord.guild_id),
            ("DISCORD_CHANNEL_ID", &self.notify.channel_id),
        ];
        for (var, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }
        }

        if self.cache_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: "DISCORD_CACHE_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.admin_role_id.is_empty() {
            log::warn!("DISCORD_ADMIN_ROLE_ID is not set, nobody can accept or refuse bookings");
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DISCORD_BOT_TOKEN", "bot-token"),
            ("DISCORD_SERVER_ID", "guild"),
            ("DISCORD_CHANNEL_ID", "channel"),
        ]
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DISCORD_BOT_TOKEN".to_string(),
            hint: "Use the developer portal".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DISCORD_BOT_TOKEN"));
        assert!(msg.contains("Use the developer portal"));
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            ServerConfig::from_vars(vars(&minimal()), None, DatabaseConfig::default()).unwrap();

        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.notify.time_zone, "Europe/Paris");
        assert_eq!(config.notify.channel_id, "channel");
        assert_eq!(config.discord.guild_id, "guild");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(config.admin_role_id.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_channel_is_reported() {
        let err = ServerConfig::from_vars(
            vars(&[("DISCORD_BOT_TOKEN", "t"), ("DISCORD_SERVER_ID", "g")]),
            None,
            DatabaseConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "DISCORD_CHANNEL_ID"));
    }

    #[test]
    fn test_bind_override_wins() {
        let mut pairs = minimal();
        pairs.push(("SERVER_BIND", "not an address"));
        let bind: SocketAddr = "0.0.0.0:8080".parse().unwrap();

        let config =
            ServerConfig::from_vars(vars(&pairs), Some(bind), DatabaseConfig::default()).unwrap();
        assert_eq!(config.bind, bind);
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        let mut pairs = minimal();
        pairs.push(("SERVER_BIND", "localhost"));

        let err =
            ServerConfig::from_vars(vars(&pairs), None, DatabaseConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SERVER_BIND"));
    }

    #[test]
    fn test_validation_rejects_zero_ttl() {
        let mut pairs = minimal();
        pairs.push(("DISCORD_CACHE_TTL_SECS", "0"));

        let config =
            ServerConfig::from_vars(vars(&pairs), None, DatabaseConfig::default()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DISCORD_CACHE_TTL_SECS"));
    }

    #[test]
    fn test_validation_rejects_blank_token() {
        let mut pairs = minimal();
        pairs[0] = ("DISCORD_BOT_TOKEN", "   ");

        let config =
            ServerConfig::from_vars(vars(&pairs), None, DatabaseConfig::default()).unwrap();
        assert!(config.validate().is_err());
    }
}
