use serde::Serialize;
use std::str::FromStr;

use crate::error::ValidationError;

/// Position held on the venue for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Flat,
    Long,
    Short,
}

impl PositionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Long => "long",
            Self::Short => "short",
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    /// Direction implied by a signed venue size (positive long, negative short).
    pub fn from_signed_size(size: rust_decimal::Decimal) -> Self {
        if size.is_sign_positive() && !size.is_zero() {
            Self::Long
        } else if size.is_sign_negative() && !size.is_zero() {
            Self::Short
        } else {
            Self::Flat
        }
    }
}

impl std::fmt::Display for PositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PositionState {
    type Err = ValidationError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            _ => Err(ValidationError::UnknownVariant {
                kind: "position",
                value: raw.to_string(),
            }),
        }
    }
}

/// Order action (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Buy,
    Sell,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for ActionKind {
    type Err = ValidationError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(ValidationError::UnknownVariant {
                kind: "action",
                value: raw.to_string(),
            }),
        }
    }
}
