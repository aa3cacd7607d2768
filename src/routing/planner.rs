//! Position transition classification.
//!
//! Only `(previous_position, position)` from the signal decides the
//! category; the live venue position is consulted solely to size reversals.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{OrderIntent, PositionState};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Flat to long or short
    Open,
    /// Long or short to flat
    Close,
    /// Long to short or short to long
    Reverse,
    /// Same position before and after
    Hold,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Reverse => "reverse",
            Self::Hold => "hold",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn classify(previous: PositionState, current: PositionState) -> Transition {
    use PositionState::*;

    match (previous, current) {
        (Long, Short) | (Short, Long) => Transition::Reverse,
        (Long | Short, Flat) => Transition::Close,
        (Flat, Long | Short) => Transition::Open,
        _ => Transition::Hold,
    }
}

/// Closing orders must never overshoot into the opposite side.
pub fn plan_reduce_only(transition: Transition) -> bool {
    transition == Transition::Close
}

/// A reversal against a live opposite position needs twice the size: one
/// half offsets the old position, the other opens the new one. Anything
/// else (or a venue that already matches the target) trades the signal size.
pub fn plan_size_multiplier(
    transition: Transition,
    live: PositionState,
    requested: PositionState,
) -> u32 {
    if transition == Transition::Reverse && !live.is_flat() && live != requested {
        2
    } else {
        1
    }
}

/// Everything the router needs to place one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPlan {
    pub transition: Transition,
    pub reduce_only: bool,
    pub size_multiplier: u32,
    pub size: Decimal,
}

/// Build the order plan for `intent`. `live` is the venue position when it
/// was queried; without it no size adjustment is made.
pub fn plan(
    intent: &OrderIntent,
    live: Option<PositionState>,
) -> Result<OrderPlan, ValidationError> {
    let transition = classify(intent.previous_position(), intent.position());
    let size_multiplier = live
        .map(|live| plan_size_multiplier(transition, live, intent.position()))
        .unwrap_or(1);

    let size = intent
        .contracts()
        .checked_mul(Decimal::from(size_multiplier))
        .ok_or_else(|| ValidationError::InvalidNumber {
            field: "contracts",
            reason: format!("{} x{} overflows", intent.contracts(), size_multiplier),
        })?;

    Ok(OrderPlan {
        transition,
        reduce_only: plan_reduce_only(transition),
        size_multiplier,
        size,
    })
}
