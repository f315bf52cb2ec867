use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Wall-clock ceiling for the booking transaction, applied as a
    /// statement timeout inside the transaction.
    #[serde(default = "default_tx_timeout_ms")]
    pub booking_tx_timeout_ms: u64,

    /// Largest availability window a single query may ask for.
    #[serde(default = "default_availability_window_days")]
    pub availability_window_days: i64,

    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: i64,
}

fn default_tx_timeout_ms() -> u64 {
    3_000
}

fn default_availability_window_days() -> i64 {
    366
}

fn default_rate_limit_per_minute() -> i64 {
    120
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            booking_tx_timeout_ms: default_tx_timeout_ms(),
            availability_window_days: default_availability_window_days(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base config checked into the repo
            .add_source(config::File::with_name("config/default"))
            // Per-environment file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `VERANDA__SERVER__PORT=9090` overrides server.port
            .add_source(config::Environment::with_prefix("VERANDA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_defaults_are_sane() {
        let rules = BusinessRules::default();
        assert!(rules.booking_tx_timeout_ms >= 1_000);
        assert!(rules.availability_window_days >= 31);
        assert!(rules.rate_limit_per_minute > 0);
    }
}
