//! In-memory venue for dry runs.
//!
//! Orders fill at their limit price unless resting limits are enabled, in
//! which case they sit on a per-asset book until canceled. Positions are
//! signed sizes netted the way a perpetual venue nets them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use super::size_decimals::SizeDecimals;
use crate::domain::{OrderIntent, PositionState};
use crate::error::Result;
use crate::exchange::{ExchangeGateway, ExchangeKind, OrderResult};

#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub oid: String,
    pub is_buy: bool,
    pub size: Decimal,
    pub price: Decimal,
    pub reduce_only: bool,
}

#[derive(Debug, Default)]
struct Book {
    /// Signed: positive long, negative short
    position: Decimal,
    resting: Vec<RestingOrder>,
}

pub struct PaperGateway {
    books: Mutex<HashMap<String, Book>>,
    size_decimals: SizeDecimals,
    rest_limits: bool,
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperGateway {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
            size_decimals: SizeDecimals::local_only(),
            rest_limits: false,
        }
    }

    /// Keep limit orders on the book instead of filling them.
    pub fn with_resting_limits(mut self) -> Self {
        self.rest_limits = true;
        self
    }

    /// Seed a signed position for `asset`.
    pub fn set_position(&self, asset: &str, signed_size: Decimal) {
        self.with_book(asset, |book| book.position = signed_size);
    }

    pub fn position_size(&self, asset: &str) -> Decimal {
        self.with_book(asset, |book| book.position)
    }

    pub fn resting_orders(&self, asset: &str) -> Vec<RestingOrder> {
        self.with_book(asset, |book| book.resting.clone())
    }

    fn with_book<T>(&self, asset: &str, f: impl FnOnce(&mut Book) -> T) -> T {
        let mut books = self
            .books
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(books.entry(asset.to_string()).or_default())
    }
}

#[async_trait]
impl ExchangeGateway for PaperGateway {
    fn kind(&self) -> ExchangeKind {
        ExchangeKind::Paper
    }

    #[instrument(skip(self, intent), fields(asset = %intent.ticker()))]
    async fn place_order(
        &self,
        intent: &OrderIntent,
        reduce_only: bool,
        market: bool,
    ) -> Result<OrderResult> {
        let asset = intent.ticker();
        let mut size = self.size_decimals.round(asset, intent.contracts()).await;
        if size.is_zero() {
            return Ok(OrderResult::rejected("Order has zero size."));
        }

        let is_buy = intent.is_buy();
        let result = self.with_book(asset, |book| {
            if reduce_only {
                let reduces = (is_buy && book.position.is_sign_negative())
                    || (!is_buy && book.position.is_sign_positive());
                if book.position.is_zero() || !reduces {
                    return OrderResult::rejected(
                        "Reduce only order would increase position.",
                    );
                }
                size = size.min(book.position.abs());
            }

            let oid = Uuid::new_v4().to_string();
            if self.rest_limits && !market {
                book.resting.push(RestingOrder {
                    oid: oid.clone(),
                    is_buy,
                    size,
                    price: intent.price(),
                    reduce_only,
                });
                return OrderResult::resting(oid);
            }

            book.position += if is_buy { size } else { -size };
            OrderResult::filled(oid, size, intent.price())
        });

        info!("DRY RUN: {} {} {} -> {:?}", intent.action(), size, asset, result.status);
        Ok(result)
    }

    async fn cancel_existing_orders(&self, asset: &str) -> Result<Vec<String>> {
        let canceled: Vec<String> = self.with_book(asset, |book| {
            book.resting.drain(..).map(|order| order.oid).collect()
        });
        for oid in &canceled {
            info!("- canceling order {} for {}", oid, asset);
        }
        Ok(canceled)
    }

    async fn has_open_position(&self, asset: &str) -> Result<PositionState> {
        Ok(PositionState::from_signed_size(self.position_size(asset)))
    }

    async fn close_positions(&self, asset: &str) -> Result<bool> {
        let closed = self.with_book(asset, |book| {
            let had_position = !book.position.is_zero();
            book.position = Decimal::ZERO;
            had_position
        });
        if closed {
            info!("DRY RUN: closed {} position", asset);
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn intent(action: &str, contracts: f64) -> OrderIntent {
        OrderIntent::from_value(json!({
            "id": "paper",
            "action": action,
            "contracts": contracts,
            "ticker": "SOLUSD",
            "position": "long",
            "previous_position": "flat",
            "position_size": 0,
            "price": 197.8
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fills_net_into_position() {
        let venue = PaperGateway::new();

        venue.place_order(&intent("buy", 1.0), false, false).await.unwrap();
        assert_eq!(venue.has_open_position("SOL").await.unwrap(), PositionState::Long);

        venue.place_order(&intent("sell", 2.0), false, true).await.unwrap();
        assert_eq!(venue.position_size("SOL"), dec!(-1));
        assert_eq!(venue.has_open_position("SOL").await.unwrap(), PositionState::Short);
    }

    #[tokio::test]
    async fn reduce_only_never_flips() {
        let venue = PaperGateway::new();
        venue.set_position("SOL", dec!(1));

        let result = venue.place_order(&intent("sell", 5.0), true, false).await.unwrap();
        assert_eq!(result.filled_size, Some(dec!(1)));
        assert_eq!(venue.has_open_position("SOL").await.unwrap(), PositionState::Flat);

        let result = venue.place_order(&intent("sell", 1.0), true, false).await.unwrap();
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn resting_limits_can_be_canceled() {
        let venue = PaperGateway::new().with_resting_limits();

        let result = venue.place_order(&intent("buy", 1.0), false, false).await.unwrap();
        assert!(result.is_success());
        assert_eq!(venue.resting_orders("SOL").len(), 1);
        assert_eq!(venue.has_open_position("SOL").await.unwrap(), PositionState::Flat);

        let canceled = venue.cancel_existing_orders("SOL").await.unwrap();
        assert_eq!(canceled, vec![result.order_id.unwrap()]);
        assert!(venue.resting_orders("SOL").is_empty());
    }

    #[tokio::test]
    async fn size_rounds_to_asset_precision() {
        let venue = PaperGateway::new();
        let result = venue.place_order(&intent("buy", 1.234), false, true).await.unwrap();
        assert_eq!(result.filled_size, Some(dec!(1.23)));

        let result = venue.place_order(&intent("buy", 0.001), false, true).await.unwrap();
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn close_positions_flattens() {
        let venue = PaperGateway::new();
        assert!(!venue.close_positions("SOL").await.unwrap());

        venue.set_position("SOL", dec!(-3));
        assert!(venue.close_positions("SOL").await.unwrap());
        assert_eq!(venue.position_size("SOL"), Decimal::ZERO);
    }
}
