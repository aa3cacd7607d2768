//! signal-router CLI
//!
//! Commands:
//! - `signal-router serve` - Run the webhook server
//! - `signal-router submit` - Route one alert payload and exit
//! - `signal-router close` - Cancel resting orders and flatten one asset

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{ticker, OrderIntent};
use crate::exchange::build_gateway;
use crate::logging::init_logging;
use crate::routing::{OrderRouter, RouterOptions};
use crate::services::WebhookServer;

/// TradingView webhook to perpetual futures order router
#[derive(Parser, Debug)]
#[command(name = "signal-router")]
#[command(author, version, about = "Routes TradingView alerts to perpetual futures orders")]
pub struct Cli {
    /// Route to the paper venue instead of placing real orders
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration directory
    #[arg(long, global = true, default_value = "config")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the webhook server
    Serve {
        /// Port override
        #[arg(short, long)]
        port: Option<u16>,
        /// Bind address override
        #[arg(long)]
        host: Option<String>,
    },

    /// Route one alert payload (JSON) and print the outcome
    Submit {
        /// Payload file; stdin when absent
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Cancel resting orders and close the position for one asset
    Close {
        /// Asset or TradingView ticker, e.g. BTC or BTCUSDT.P
        ticker: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;
        let _log_guard = init_logging(&config.logging);

        let gateway = build_gateway(&config)
            .await
            .context("failed to build exchange gateway")?;
        let router = OrderRouter::new(gateway, RouterOptions::from(&config));

        match self.command {
            Commands::Serve { port, host } => {
                let host = host.unwrap_or_else(|| config.server.host.clone());
                let port = port.unwrap_or(config.server.port);
                WebhookServer::new(router, host, port).run().await?;
            }
            Commands::Submit { file } => {
                let body = read_payload(file.as_ref())?;
                let intent = OrderIntent::from_slice(&body)?;
                info!("Submitting {}", intent);

                let outcome = router.route(intent).await?;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                if !outcome.is_success() {
                    return Err(anyhow!("order was not accepted"));
                }
            }
            Commands::Close { ticker } => {
                let asset = ticker::strip_suffixes(&ticker.trim().to_ascii_uppercase());
                let gateway = router.gateway();

                let canceled = gateway.cancel_existing_orders(&asset).await?;
                let closed = gateway.close_positions(&asset).await?;
                println!(
                    "{}: canceled {} order(s), {}",
                    asset,
                    canceled.len(),
                    if closed { "position closed" } else { "no position closed" }
                );
            }
        }

        Ok(())
    }

    fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;
        if self.dry_run {
            config.dry_run.enabled = true;
        }

        config
            .validate()
            .map_err(|errors| anyhow!("invalid configuration:\n  {}", errors.join("\n  ")))?;
        Ok(config)
    }
}

fn read_payload(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read payload {}", path.display())),
        None => {
            let mut body = Vec::new();
            std::io::stdin()
                .read_to_end(&mut body)
                .context("failed to read payload from stdin")?;
            Ok(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["signal-router", "close", "BTCUSDT.P", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Commands::Close { ref ticker } if ticker == "BTCUSDT.P"));
    }

    #[test]
    fn test_parse_serve_port() {
        let cli = Cli::try_parse_from(["signal-router", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080), host: None }));
        assert_eq!(cli.config, PathBuf::from("config"));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["signal-router"]).is_err());
    }
}
