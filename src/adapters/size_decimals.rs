//! Per-asset size precision.
//!
//! Hyperliquid rejects sizes with more decimals than the asset's
//! `szDecimals`. A local table covers the commonly traded assets since the
//! meta endpoint can time out; anything else is looked up once and memoized.
//! When nothing is known the size is truncated to whole contracts, which the
//! venue always accepts and which never oversizes the order.

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::precision::{round_size_to, truncate_size_to};
use crate::error::{Result, RouterError};

/// Fallback when an asset's precision cannot be resolved
pub const DEFAULT_SIZE_DECIMALS: u32 = 0;

const KNOWN_SIZE_DECIMALS: &[(&str, u32)] = &[
    ("BTC", 5),
    ("ETH", 4),
    ("SOL", 2),
    ("AVAX", 2),
    ("INJ", 1),
    ("SUI", 1),
    ("STX", 1),
    ("RNDR", 1),
    ("FTM", 0),
    ("APT", 2),
    ("SEI", 0),
    ("TIA", 1),
    ("PENDLE", 0),
    ("NEAR", 1),
    ("NTRN", 0),
    ("WIF", 0),
    ("ONDO", 0),
    ("ALT", 0),
    ("TAO", 3),
];

/// Remote source of size precision (the venue's asset metadata).
#[async_trait]
pub trait SizeDecimalsSource: Send + Sync {
    /// `Ok(None)` when the venue does not list the asset.
    async fn fetch_size_decimals(&self, asset: &str) -> Result<Option<u32>>;
}

/// Read-through asset -> size decimals cache, shared by concurrent requests.
pub struct SizeDecimals {
    cache: DashMap<String, u32>,
    source: Option<Arc<dyn SizeDecimalsSource>>,
}

impl SizeDecimals {
    pub fn new(source: Arc<dyn SizeDecimalsSource>) -> Self {
        Self {
            cache: Self::seeded(),
            source: Some(source),
        }
    }

    /// Local table only, no remote lookups.
    pub fn local_only() -> Self {
        Self {
            cache: Self::seeded(),
            source: None,
        }
    }

    fn seeded() -> DashMap<String, u32> {
        KNOWN_SIZE_DECIMALS
            .iter()
            .map(|(asset, decimals)| (asset.to_string(), *decimals))
            .collect()
    }

    /// Resolve the size decimals for `asset`. Never fails: an unknown asset or
    /// a failed lookup yields [`DEFAULT_SIZE_DECIMALS`].
    pub async fn lookup(&self, asset: &str) -> u32 {
        self.resolve(asset).await.unwrap_or(DEFAULT_SIZE_DECIMALS)
    }

    async fn resolve(&self, asset: &str) -> Option<u32> {
        if let Some(decimals) = self.cache.get(asset) {
            debug!("Using local size decimals for {} - {}", asset, *decimals);
            return Some(*decimals);
        }

        let source = self.source.as_ref()?;
        match source.fetch_size_decimals(asset).await {
            Ok(Some(decimals)) => {
                debug!("Using API size decimals for {} - {}", asset, decimals);
                self.cache.insert(asset.to_string(), decimals);
                Some(decimals)
            }
            Ok(None) => {
                warn!("{} not listed in venue metadata, truncating size to whole contracts", asset);
                None
            }
            Err(e) => {
                let err = RouterError::PrecisionLookup(format!("{asset}: {e}"));
                warn!("{}, truncating size to whole contracts", err);
                None
            }
        }
    }

    /// Round `size` to the precision the venue accepts for `asset`. Without
    /// a known precision the size is truncated, never rounded up.
    pub async fn round(&self, asset: &str, size: Decimal) -> Decimal {
        match self.resolve(asset).await {
            Some(decimals) => round_size_to(size, decimals),
            None => truncate_size_to(size, DEFAULT_SIZE_DECIMALS),
        }
    }

    pub fn is_cached(&self, asset: &str) -> bool {
        self.cache.contains_key(asset)
    }
}
