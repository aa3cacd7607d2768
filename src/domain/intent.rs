use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::precision::{round_price, round_size, stop_loss, MAX_ORDER_NUMBER};
use super::ticker::normalize;
use super::{ActionKind, PositionState};
use crate::error::ValidationError;

/// Inbound webhook payload exactly as TradingView sends it.
///
/// Every field is optional here so a missing one is reported by name
/// instead of as a generic JSON error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalPayload {
    pub id: Option<String>,
    pub action: Option<String>,
    pub contracts: Option<Decimal>,
    pub ticker: Option<String>,
    pub position: Option<String>,
    pub previous_position: Option<String>,
    pub position_size: Option<Decimal>,
    pub price: Option<Decimal>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })
}

fn in_range(value: Decimal, field: &'static str) -> Result<Decimal, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::InvalidNumber {
            field,
            reason: format!("must not be negative, got {value}"),
        });
    }
    if value > MAX_ORDER_NUMBER {
        return Err(ValidationError::InvalidNumber {
            field,
            reason: format!("must not exceed {MAX_ORDER_NUMBER}, got {value}"),
        });
    }
    Ok(value)
}

/// One requested trade, normalized and rounded for the venue.
///
/// Built once per signal and never mutated; resizing for a reversal goes
/// through [`OrderIntent::with_contracts`], which returns a new intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderIntent {
    id: String,
    action: ActionKind,
    contracts: Decimal,
    ticker: String,
    position: PositionState,
    previous_position: PositionState,
    position_size: Decimal,
    price: Decimal,
}

impl OrderIntent {
    /// Decode a raw JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let payload: SignalPayload = serde_json::from_slice(body)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::try_from(payload)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        let payload: SignalPayload = serde_json::from_value(value)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::try_from(payload)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn contracts(&self) -> Decimal {
        self.contracts
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn previous_position(&self) -> PositionState {
        self.previous_position
    }

    pub fn position_size(&self) -> Decimal {
        self.position_size
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn is_buy(&self) -> bool {
        self.action.is_buy()
    }

    pub fn stop_loss_price(&self) -> Result<Decimal, ValidationError> {
        stop_loss(self.price, self.is_buy())
    }

    /// Copy of this intent with a different (re-rounded) size.
    pub fn with_contracts(&self, contracts: Decimal) -> Self {
        Self {
            contracts: round_size(contracts),
            ..self.clone()
        }
    }
}

impl TryFrom<SignalPayload> for OrderIntent {
    type Error = ValidationError;

    fn try_from(payload: SignalPayload) -> Result<Self, Self::Error> {
        let id = required(payload.id, "id")?;
        let action = required(payload.action, "action")?.parse::<ActionKind>()?;
        let contracts = in_range(required(payload.contracts, "contracts")?, "contracts")?;
        let ticker = normalize(&required(payload.ticker, "ticker")?)?;
        let position = required(payload.position, "position")?.parse::<PositionState>()?;
        let previous_position =
            required(payload.previous_position, "previous_position")?.parse::<PositionState>()?;
        let position_size = required(payload.position_size, "position_size")?;
        let price = in_range(required(payload.price, "price")?, "price")?;

        Ok(Self {
            id,
            action,
            contracts: round_size(contracts),
            ticker,
            position,
            previous_position,
            position_size,
            price: round_price(price),
        })
    }
}

impl std::fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} @ {}",
            self.action, self.contracts, self.ticker, self.price
        )
    }
}
