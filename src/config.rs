use std::time::Duration;

use config::ConfigError;
use secrecy::Secret;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SCAN_SESSION_TTL_SECS: u64 = 900;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    // Ticketing services (booking portals, validation services)
    pub http_timeout_secs: u64,

    // Idle scan sessions are dropped after this many seconds
    pub scan_session_ttl_secs: u64,

    // Key sealing parcels that carry booking key material
    pub parcel_key: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Self::from_config(&config)
    }

    pub fn from_config(config: &config::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            host: get_or(config, "host", DEFAULT_HOST.to_string())?,
            port: get_or(config, "port", DEFAULT_PORT)?,

            http_timeout_secs: get_or(config, "http_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS)?,
            scan_session_ttl_secs: get_or(
                config,
                "scan_session_ttl_secs",
                DEFAULT_SCAN_SESSION_TTL_SECS,
            )?,

            parcel_key: Secret::new(config.get("parcel_key")?),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn scan_session_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(Duration::from_secs(self.scan_session_ttl_secs))
            .unwrap_or_else(|_| chrono::Duration::max_value())
    }
}

/// Reads `key`, falling back to `default` only when the key is absent
fn get_or<T: DeserializeOwned>(
    config: &config::Config,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match config.get(key) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults_apply() {
        let source = config::Config::builder()
            .set_override("parcel_key", "test-key")
            .unwrap()
            .build()
            .unwrap();

        let config = Config::from_config(&source).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.scan_session_ttl(), chrono::Duration::minutes(15));
        assert_eq!(config.parcel_key.expose_secret(), "test-key");
    }

    #[test]
    fn test_overrides_and_required_key() {
        let source = config::Config::builder()
            .set_override("port", 9000)
            .unwrap()
            .set_override("http_timeout_secs", 3)
            .unwrap()
            .build()
            .unwrap();

        assert!(Config::from_config(&source).is_err());

        let source = config::Config::builder()
            .set_override("port", 9000)
            .unwrap()
            .set_override("http_timeout_secs", 3)
            .unwrap()
            .set_override("parcel_key", "k")
            .unwrap()
            .build()
            .unwrap();
        let config = Config::from_config(&source).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.http_timeout_secs, 3);
    }

    #[test]
    fn test_malformed_port_is_an_error() {
        let source = config::Config::builder()
            .set_override("port", "eighty")
            .unwrap()
            .set_override("parcel_key", "k")
            .unwrap()
            .build()
            .unwrap();

        assert!(Config::from_config(&source).is_err());
    }
}
