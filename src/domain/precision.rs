//! Venue precision rules for prices and sizes.
//!
//! Hyperliquid accepts at most 5 significant figures on a price and never
//! more than 6 decimals: 1234.5 is valid, 1234.56 is not; 0.001234 is valid,
//! 0.0012345 is not. Sizes are fixed-decimal, not significant-figure based.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::ValidationError;

pub const PRICE_SIGNIFICANT_FIGURES: u32 = 5;
pub const PRICE_MAX_DECIMALS: u32 = 6;
pub const SIZE_DECIMALS: u32 = 4;

/// 20% account risk at 10x leverage
pub const STOP_LOSS_PCT: Decimal = dec!(0.02);

/// Largest size or price an alert may carry. Far above anything the venue
/// lists, and small enough that doubling a size or adding the stop offset
/// can never overflow a `Decimal`.
pub const MAX_ORDER_NUMBER: Decimal = dec!(1000000000000);

/// Exact decimal ties round to even. Float-formatting implementations may
/// land either side of a tie (3500.35 is stored below the midpoint as an
/// f64), so results can differ from them on exact ties only.
const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;

pub fn round_price(price: Decimal) -> Decimal {
    price
        .round_sf_with_strategy(PRICE_SIGNIFICANT_FIGURES, ROUNDING)
        .unwrap_or(price)
        .round_dp_with_strategy(PRICE_MAX_DECIMALS, ROUNDING)
        .normalize()
}

pub fn round_size(size: Decimal) -> Decimal {
    round_size_to(size, SIZE_DECIMALS)
}

/// Round a size to an asset-specific number of decimals.
pub fn round_size_to(size: Decimal, decimals: u32) -> Decimal {
    size.round_dp_with_strategy(decimals, ROUNDING).normalize()
}

/// Truncate a size toward zero. Used when the venue precision is unknown,
/// so the order can only shrink.
pub fn truncate_size_to(size: Decimal, decimals: u32) -> Decimal {
    size.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
        .normalize()
}

/// Stop price 2% against the entry: below it for a buy, above it for a sell.
pub fn stop_loss(price: Decimal, is_buy: bool) -> Result<Decimal, ValidationError> {
    let overflow = || ValidationError::InvalidNumber {
        field: "price",
        reason: format!("stop loss for {price} overflows"),
    };

    let offset = price.checked_mul(STOP_LOSS_PCT).ok_or_else(overflow)?;
    let raw = if is_buy {
        price.checked_sub(offset)
    } else {
        price.checked_add(offset)
    }
    .ok_or_else(overflow)?;
    Ok(round_price(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(dec!(3500.345)), dec!(3500.3));
        assert_eq!(round_price(dec!(197.5845)), dec!(197.58));
        assert_eq!(round_price(dec!(6.96)), dec!(6.96));
    }

    #[test]
    fn test_round_price_caps_decimals() {
        // 5 significant figures would keep 0.0000012345, 6 decimals wins
        assert_eq!(round_price(dec!(0.0000012345)), dec!(0.000001));
        assert_eq!(round_price(dec!(0.0012345)), dec!(0.001234));
    }

    #[test]
    fn test_round_price_large_values_lose_integer_digits() {
        assert_eq!(round_price(dec!(123456.7)), dec!(123460));
    }

    #[test]
    fn test_round_size() {
        assert_eq!(round_size(dec!(0.165112)), dec!(0.1651));
        assert_eq!(round_size(dec!(22.22222)), dec!(22.2222));
        assert_eq!(round_size(dec!(1.12345)), dec!(1.1234));
    }

    #[test]
    fn test_round_size_to_venue_decimals() {
        assert_eq!(round_size_to(dec!(27.36), 1), dec!(27.4));
        assert_eq!(round_size_to(dec!(170.4), 0), dec!(170));
    }

    #[test]
    fn test_stop_loss() {
        assert_eq!(stop_loss(dec!(100), true).unwrap(), dec!(98));
        assert_eq!(stop_loss(dec!(100), false).unwrap(), dec!(102));
        // 3500.3 * 0.98 = 3430.294
        assert_eq!(stop_loss(dec!(3500.3), true).unwrap(), dec!(3430.3));
    }

    #[test]
    fn test_stop_loss_overflow_is_an_error() {
        let huge = dec!(79000000000000000000000000000);
        assert!(matches!(
            stop_loss(huge, false),
            Err(ValidationError::InvalidNumber { field: "price", .. })
        ));
        assert!(stop_loss(huge, true).is_ok());
    }

    #[test]
    fn test_exact_ties_round_to_even() {
        assert_eq!(round_price(dec!(3500.35)), dec!(3500.4));
        assert_eq!(round_price(dec!(3500.25)), dec!(3500.2));
        assert_eq!(round_size(dec!(0.00005)), dec!(0));
    }

    #[test]
    fn test_truncate_size_never_rounds_up() {
        assert_eq!(truncate_size_to(dec!(12.6), 0), dec!(12));
        assert_eq!(truncate_size_to(dec!(0.6), 0), dec!(0));
        assert_eq!(truncate_size_to(dec!(1.239), 2), dec!(1.23));
    }

    #[test]
    fn test_rounding_is_deterministic() {
        let a = round_price(dec!(197.5845));
        let b = round_price(dec!(197.5845));
        assert_eq!(a.serialize(), b.serialize());
    }
}
