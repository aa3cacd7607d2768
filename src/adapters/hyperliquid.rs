//! Hyperliquid perpetuals adapter built on `hyperliquid_rust_sdk`.
//!
//! Sizes are rounded to the asset's `szDecimals` just before submission;
//! price precision has already been applied when the intent was built.

use async_trait::async_trait;
use hyperliquid_rust_sdk::{
    BaseUrl, ClientCancelRequest, ClientLimit, ClientOrder, ClientOrderRequest,
    ExchangeClient, ExchangeDataStatus, ExchangeResponseStatus, InfoClient, MarketCloseParams,
    MarketOrderParams,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::size_decimals::{SizeDecimals, SizeDecimalsSource};
use crate::config::ExchangeConfig;
use crate::domain::{OrderIntent, PositionState};
use crate::error::{Result, RouterError};
use crate::exchange::{ExchangeGateway, ExchangeKind, OrderResult, OrderStatus};
use crate::signing::Wallet;

/// Max slippage for market orders (1%)
const MARKET_SLIPPAGE: f64 = 0.01;

fn gateway_err(context: &str, err: impl std::fmt::Display) -> RouterError {
    RouterError::Gateway(format!("{}: {}", context, err))
}

fn to_f64(value: Decimal, field: &'static str) -> Result<f64> {
    value.to_f64().ok_or_else(|| {
        RouterError::Validation(crate::error::ValidationError::InvalidNumber {
            field,
            reason: format!("{value} is not representable as f64"),
        })
    })
}

fn base_url(testnet: bool) -> BaseUrl {
    if testnet {
        BaseUrl::Testnet
    } else {
        BaseUrl::Mainnet
    }
}

/// Cancel each `(coin, oid)` in turn, returning the ids that were canceled.
/// A failed cancel is logged and the rest still go out.
async fn cancel_each<F, Fut>(orders: Vec<(String, u64)>, cancel: F) -> Vec<String>
where
    F: Fn(String, u64) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<(), String>>,
{
    let mut canceled = Vec::new();
    for (coin, oid) in orders {
        info!("- canceling order {} for {}", oid, coin);
        match cancel(coin.clone(), oid).await {
            Ok(()) => canceled.push(oid.to_string()),
            Err(e) => warn!("- failed to cancel order {} for {}: {}", oid, coin, e),
        }
    }
    canceled
}

/// Position for `asset` from `(coin, szi)` pairs. Direction is the sign of
/// `szi`, which the API sends as a string. A failed query, a missing asset
/// or an unparseable size all read as flat.
fn position_from_sizes<E: std::fmt::Display>(
    sizes: std::result::Result<Vec<(String, String)>, E>,
    asset: &str,
) -> PositionState {
    let sizes = match sizes {
        Ok(sizes) => sizes,
        Err(e) => {
            warn!("Failed to get user state, assuming flat: {}", e);
            return PositionState::Flat;
        }
    };

    sizes
        .into_iter()
        .find(|(coin, _)| coin == asset)
        .and_then(|(_, szi)| Decimal::from_str(&szi).ok())
        .map(PositionState::from_signed_size)
        .unwrap_or(PositionState::Flat)
}

/// Asset metadata lookups against the info endpoint
struct MetaSource {
    info: Arc<InfoClient>,
}

#[async_trait]
impl SizeDecimalsSource for MetaSource {
    async fn fetch_size_decimals(&self, asset: &str) -> Result<Option<u32>> {
        let meta = self
            .info
            .meta()
            .await
            .map_err(|e| gateway_err("Failed to get asset contract rounding size", e))?;

        Ok(meta
            .universe
            .into_iter()
            .find(|asset_info| asset_info.name == asset)
            .map(|asset_info| asset_info.sz_decimals))
    }
}

pub struct HyperliquidGateway {
    exchange: ExchangeClient,
    info: Arc<InfoClient>,
    wallet: Wallet,
    size_decimals: SizeDecimals,
}

impl HyperliquidGateway {
    /// Connect to mainnet or testnet. The HTTP client carries the configured
    /// request timeout; the SDK itself has none.
    pub async fn connect(wallet: Wallet, config: &ExchangeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("signal-router/0.1")
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| gateway_err("failed to build HTTP client", e))?;

        let exchange = ExchangeClient::new(
            Some(http.clone()),
            wallet.inner().clone(),
            Some(base_url(config.testnet)),
            None,
            None,
        )
        .await
        .map_err(|e| gateway_err("failed to create exchange client", e))?;
        let info = Arc::new(
            InfoClient::new(Some(http), Some(base_url(config.testnet)))
                .await
                .map_err(|e| gateway_err("failed to create info client", e))?,
        );

        let size_decimals = SizeDecimals::new(Arc::new(MetaSource { info: info.clone() }));

        info!(
            "Connected to Hyperliquid {} as {:?}",
            if config.testnet { "testnet" } else { "mainnet" },
            wallet.address()
        );

        Ok(Self {
            exchange,
            info,
            wallet,
            size_decimals,
        })
    }

    fn order_result(response: ExchangeResponseStatus) -> OrderResult {
        let response = match response {
            ExchangeResponseStatus::Ok(response) => response,
            ExchangeResponseStatus::Err(e) => return OrderResult::rejected(e),
        };

        let status = response
            .data
            .and_then(|data| data.statuses.into_iter().next());

        match status {
            Some(ExchangeDataStatus::Resting(resting)) => {
                OrderResult::resting(resting.oid.to_string())
            }
            Some(ExchangeDataStatus::Filled(filled)) => OrderResult {
                order_id: Some(filled.oid.to_string()),
                status: OrderStatus::Filled,
                filled_size: Decimal::from_str(&filled.total_sz).ok(),
                avg_price: Decimal::from_str(&filled.avg_px).ok(),
            },
            Some(ExchangeDataStatus::Error(e)) => OrderResult::rejected(e),
            _ => OrderResult {
                order_id: None,
                status: OrderStatus::Accepted,
                filled_size: None,
                avg_price: None,
            },
        }
    }
}

#[async_trait]
impl ExchangeGateway for HyperliquidGateway {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Hyperliquid
    }

    #[instrument(skip(self, intent), fields(asset = %intent.ticker()))]
    async fn place_order(
        &self,
        intent: &OrderIntent,
        reduce_only: bool,
        market: bool,
    ) -> Result<OrderResult> {
        let asset = intent.ticker();
        let size = self.size_decimals.round(asset, intent.contracts()).await;
        if size.is_zero() {
            warn!("{} size {} rounds to zero, not submitting", asset, intent.contracts());
            return Ok(OrderResult::rejected("Order has zero size."));
        }
        let sz = to_f64(size, "contracts")?;

        let response = if market && reduce_only {
            self.exchange
                .market_close(MarketCloseParams {
                    asset,
                    sz: Some(sz),
                    px: None,
                    slippage: Some(MARKET_SLIPPAGE),
                    cloid: None,
                    wallet: None,
                })
                .await
        } else if market {
            self.exchange
                .market_open(MarketOrderParams {
                    asset,
                    is_buy: intent.is_buy(),
                    sz,
                    px: None,
                    slippage: Some(MARKET_SLIPPAGE),
                    cloid: None,
                    wallet: None,
                })
                .await
        } else {
            let request = ClientOrderRequest {
                asset: asset.to_string(),
                is_buy: intent.is_buy(),
                reduce_only,
                limit_px: to_f64(intent.price(), "price")?,
                sz,
                cloid: None,
                order_type: ClientOrder::Limit(ClientLimit {
                    tif: "Gtc".to_string(),
                }),
            };
            self.exchange.order(request, None).await
        }
        .map_err(|e| gateway_err("Failed to place order", e))?;

        Ok(Self::order_result(response))
    }

    #[instrument(skip(self))]
    async fn cancel_existing_orders(&self, asset: &str) -> Result<Vec<String>> {
        let open_orders = self
            .info
            .open_orders(self.wallet.address())
            .await
            .map_err(|e| gateway_err("Failed to get open orders", e))?;

        let targets = open_orders
            .into_iter()
            .filter(|order| order.coin == asset)
            .map(|order| (order.coin, order.oid))
            .collect();

        let exchange = &self.exchange;
        let canceled = cancel_each(targets, move |coin, oid| async move {
            match exchange
                .cancel(ClientCancelRequest { asset: coin, oid }, None)
                .await
            {
                Ok(ExchangeResponseStatus::Ok(_)) => Ok(()),
                Ok(ExchangeResponseStatus::Err(e)) => Err(e),
                Err(e) => Err(e.to_string()),
            }
        })
        .await;

        Ok(canceled)
    }

    #[instrument(skip(self))]
    async fn has_open_position(&self, asset: &str) -> Result<PositionState> {
        let sizes = self
            .info
            .user_state(self.wallet.address())
            .await
            .map(|state| {
                state
                    .asset_positions
                    .into_iter()
                    .map(|p| (p.position.coin, p.position.szi))
                    .collect()
            });

        let position = position_from_sizes(sizes, asset);
        debug!("Live {} position: {}", asset, position);
        Ok(position)
    }

    #[instrument(skip(self))]
    async fn close_positions(&self, asset: &str) -> Result<bool> {
        if self.has_open_position(asset).await?.is_flat() {
            info!("No open {} position to close", asset);
            return Ok(false);
        }

        let response = self
            .exchange
            .market_close(MarketCloseParams {
                asset,
                sz: None,
                px: None,
                slippage: Some(MARKET_SLIPPAGE),
                cloid: None,
                wallet: None,
            })
            .await
            .map_err(|e| gateway_err("Failed to close position", e))?;

        let result = Self::order_result(response);
        info!("Close {} response: {:?}", asset, result);
        Ok(result.is_success())
    }
}
