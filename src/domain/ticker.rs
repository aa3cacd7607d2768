//! Ticker canonicalization.
//!
//! TradingView sends tickers such as `ETHUSDT.P`, `SOL/USDT` or `ATOMUSD`;
//! the venue only knows the base asset (`ETH`, `SOL`, `ATOM`).

use crate::error::ValidationError;

/// Quote markers in removal order. `USDC` and `USDT` contain `USD`, so they go first.
const QUOTE_MARKERS: [&str; 3] = ["USDC", "USDT", "USD"];

const PERPETUAL_MARKER: &str = ".P";

const SEPARATORS: [char; 2] = ['-', '/'];

/// Canonicalize a raw ticker into its base-asset symbol.
///
/// Fails when the ticker is not USD-denominated or nothing is left once the
/// suffixes are gone.
pub fn normalize(raw: &str) -> Result<String, ValidationError> {
    let upper = raw.trim().to_ascii_uppercase();
    if !upper.contains("USD") {
        return Err(ValidationError::InvalidTicker {
            ticker: raw.to_string(),
        });
    }

    let base = strip_suffixes(&upper);
    if base.is_empty() {
        return Err(ValidationError::InvalidTicker {
            ticker: raw.to_string(),
        });
    }

    Ok(base)
}

/// Remove contract, quote and separator markers. Applying it to its own
/// output is a no-op.
pub fn strip_suffixes(ticker: &str) -> String {
    let mut out = ticker.to_ascii_uppercase().replace(PERPETUAL_MARKER, "");
    for marker in QUOTE_MARKERS {
        out = out.replace(marker, "");
    }
    out.replace(SEPARATORS, "")
}
