use std::sync::Arc;
use tracing::info;

use crate::adapters::{HyperliquidGateway, PaperGateway};
use crate::config::AppConfig;
use crate::error::Result;
use crate::signing::Wallet;

use super::{parse_exchange_kind, ExchangeGateway, ExchangeKind};

/// Create the runtime gateway from `AppConfig`.
///
/// Dry run always wins over the configured venue.
pub async fn build_gateway(app_config: &AppConfig) -> Result<Arc<dyn ExchangeGateway>> {
    let kind = if app_config.dry_run.enabled {
        ExchangeKind::Paper
    } else {
        parse_exchange_kind(&app_config.exchange.kind)?
    };

    build_gateway_for(kind, app_config).await
}

/// Create a gateway for an explicit venue.
pub async fn build_gateway_for(
    kind: ExchangeKind,
    app_config: &AppConfig,
) -> Result<Arc<dyn ExchangeGateway>> {
    match kind {
        ExchangeKind::Paper => {
            info!("DRY RUN mode - orders go to the paper venue");
            Ok(Arc::new(PaperGateway::new()))
        }
        ExchangeKind::Hyperliquid => {
            let wallet = Wallet::load(&app_config.wallet)?;
            let gateway = HyperliquidGateway::connect(wallet, &app_config.exchange).await?;
            Ok(Arc::new(gateway))
        }
    }
}
