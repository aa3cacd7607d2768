use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::{OrderIntent, PositionState};
use crate::error::{Result, RouterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    Hyperliquid,
    Paper,
}

impl Default for ExchangeKind {
    fn default() -> Self {
        Self::Hyperliquid
    }
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hyperliquid => "hyperliquid",
            Self::Paper => "paper",
        }
    }
}

impl std::fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExchangeKind {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hyperliquid" | "hl" => Ok(Self::Hyperliquid),
            "paper" | "dry_run" | "dry-run" => Ok(Self::Paper),
            _ => Err("invalid exchange; expected hyperliquid|paper"),
        }
    }
}

pub fn parse_exchange_kind(raw: &str) -> Result<ExchangeKind> {
    ExchangeKind::from_str(raw).map_err(|e| {
        RouterError::Config(config::ConfigError::Message(e.to_string()))
    })
}

/// Venue verdict on a placed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OrderStatus {
    /// Resting on the book
    Resting,
    /// Fully filled on submission
    Filled,
    /// Accepted without further detail
    Accepted,
    /// Refused by the venue
    Rejected(String),
}

/// Result of a single `place_order` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResult {
    pub order_id: Option<String>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_size: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<Decimal>,
}

impl OrderResult {
    pub fn resting(order_id: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            status: OrderStatus::Resting,
            filled_size: None,
            avg_price: None,
        }
    }

    pub fn filled(order_id: impl Into<String>, size: Decimal, avg_price: Decimal) -> Self {
        Self {
            order_id: Some(order_id.into()),
            status: OrderStatus::Filled,
            filled_size: Some(size),
            avg_price: Some(avg_price),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            order_id: None,
            status: OrderStatus::Rejected(reason.into()),
            filled_size: None,
            avg_price: None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.status, OrderStatus::Rejected(_))
    }
}

/// Capabilities the router needs from a perpetual-futures venue.
///
/// Implementations never retry; a failure to reach the venue is a
/// [`RouterError::Gateway`].
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    fn kind(&self) -> ExchangeKind;

    /// Submit a GTC limit order (or an IOC market order when `market` is set)
    /// for `intent.contracts()` of `intent.ticker()`.
    async fn place_order(
        &self,
        intent: &OrderIntent,
        reduce_only: bool,
        market: bool,
    ) -> Result<OrderResult>;

    /// Cancel every resting order on `asset`, returning the canceled ids.
    ///
    /// A failure on one order is logged and does not stop the others.
    async fn cancel_existing_orders(&self, asset: &str) -> Result<Vec<String>>;

    /// Live position for `asset`. Query failures degrade to `Flat`.
    async fn has_open_position(&self, asset: &str) -> Result<PositionState>;

    /// Flatten any open position on `asset`.
    async fn close_positions(&self, asset: &str) -> Result<bool>;
}
