use std::env;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3005;
pub const DEFAULT_DATABASE_URL: &str = "mysql://root@localhost:3306/dependabot_practice";
pub const DEFAULT_EXTERNAL_USERS_URL: &str = "https://jsonplaceholder.typicode.com/users";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    MySql,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err("expected `mysql` or `memory`".to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // anything but "production" behaves like development
        Ok(if s.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err("expected `text` or `json`".to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Serve dummy data instead of touching a store.
    pub skip_store: bool,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub database_max_connections: u32,
    pub environment: Environment,
    pub external_users_url: String,
    pub external_timeout_secs: u64,
    /// Allowed CORS origin. `None` allows any origin.
    pub client_url: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            skip_store: true,
            store_backend: StoreBackend::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: 5,
            environment: Environment::default(),
            external_users_url: DEFAULT_EXTERNAL_USERS_URL.to_string(),
            external_timeout_secs: 10,
            client_url: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source, falling back to defaults
    /// for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            skip_store: parse_flag(&lookup, "SKIP_STORE", defaults.skip_store)?,
            store_backend: parse_or(&lookup, "STORE_BACKEND", defaults.store_backend)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            environment: parse_or(&lookup, "APP_ENV", defaults.environment)?,
            external_users_url: lookup("EXTERNAL_USERS_URL").unwrap_or(defaults.external_users_url),
            external_timeout_secs: parse_or(
                &lookup,
                "EXTERNAL_TIMEOUT_SECS",
                defaults.external_timeout_secs,
            )?,
            client_url: lookup("CLIENT_URL").filter(|v| !v.trim().is_empty()),
            log_format: parse_or(&lookup, "LOG_FORMAT", defaults.log_format)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value: v,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_skip_the_store_on_port_3005() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3005);
        assert!(config.skip_store);
        assert_eq!(config.store_backend, StoreBackend::MySql);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr(), "0.0.0.0:3005");
    }

    #[test]
    fn environment_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("SKIP_STORE", "false"),
            ("STORE_BACKEND", "memory"),
            ("APP_ENV", "production"),
            ("CLIENT_URL", "http://localhost:5173"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.skip_store);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.environment.is_production());
        assert_eq!(config.client_url.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_reported_with_their_key() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("PORT has an invalid value `eighty`"));

        let err = config_from(&[("SKIP_STORE", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SKIP_STORE"));

        assert!(config_from(&[("STORE_BACKEND", "mongo")]).is_err());
    }
}
