use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::exchange::ExchangeKind;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    pub dry_run: DryRunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Venue to route to (hyperliquid | paper)
    pub kind: String,
    /// Use the venue testnet
    #[serde(default)]
    pub testnet: bool,
    /// HTTP timeout for venue calls in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExecutionConfig {
    /// Send IOC market orders instead of GTC limits
    #[serde(default)]
    pub market_orders: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RoutingConfig {
    /// Place an order even when the signal keeps the same position
    /// (pyramiding). Off by default.
    #[serde(default)]
    pub place_on_hold: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding a private key or mnemonic
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    /// File holding a private key or mnemonic, used when the variable is unset
    #[serde(default)]
    pub secret_file: Option<String>,
}

fn default_secret_env() -> String {
    "HYPERLIQUID_SECRET".to_string()
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
            secret_file: Some("secret.txt".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DryRunConfig {
    /// Enable dry run mode (paper venue, no real orders)
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `info,signal_router=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the daily rolling log file
    #[serde(default)]
    pub dir: Option<String>,
}

pub(crate) const DEFAULT_LOG_FILTER: &str = "info,signal_router=debug";

fn default_log_level() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("exchange.kind", "hyperliquid")?
            .set_default("exchange.testnet", false)?
            .set_default("dry_run.enabled", false)?
            .set_default("logging.level", DEFAULT_LOG_FILTER)?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ROUTER_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ROUTER__EXCHANGE__TESTNET, etc.)
            .add_source(
                Environment::with_prefix("ROUTER")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration for CLI usage
    pub fn default_config(dry_run: bool) -> Self {
        Self {
            exchange: ExchangeConfig {
                kind: ExchangeKind::Hyperliquid.as_str().to_string(),
                testnet: false,
                request_timeout_ms: default_request_timeout(),
            },
            execution: ExecutionConfig::default(),
            routing: RoutingConfig::default(),
            server: ServerConfig::default(),
            wallet: WalletConfig::default(),
            dry_run: DryRunConfig { enabled: dry_run },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.exchange.kind.parse::<ExchangeKind>().is_err() {
            errors.push(format!(
                "exchange.kind must be hyperliquid or paper, got '{}'",
                self.exchange.kind
            ));
        }

        if self.exchange.request_timeout_ms == 0 {
            errors.push("exchange.request_timeout_ms must be positive".to_string());
        }

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }

        if self.wallet.secret_env.trim().is_empty() && self.wallet.secret_file.is_none() {
            errors.push("wallet needs secret_env or secret_file".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default_config(true);
        assert!(config.validate().is_ok());
        assert!(config.dry_run.enabled);
        assert!(!config.routing.place_on_hold);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut config = AppConfig::default_config(false);
        config.exchange.kind = "binance".to_string();
        config.server.port = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let config = AppConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.exchange.kind, "hyperliquid");
        assert!(!config.dry_run.enabled);
        assert_eq!(config.logging.level, DEFAULT_LOG_FILTER);
    }
}
