use thiserror::Error;

/// Main error type for the order router
#[derive(Error, Debug)]
pub enum RouterError {
    // Signal validation errors
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    // Venue errors
    #[error("Gateway communication error: {0}")]
    Gateway(String),

    #[error("Precision lookup failed: {0}")]
    PrecisionLookup(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Wallet error: {0}")]
    Wallet(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for RouterError
pub type Result<T> = std::result::Result<T, RouterError>;

/// Coarse error classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    GatewayCommunication,
    PrecisionLookup,
    Configuration,
}

impl RouterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::Validation(_) => ErrorKind::Validation,
            RouterError::Gateway(_) => ErrorKind::GatewayCommunication,
            RouterError::PrecisionLookup(_) => ErrorKind::PrecisionLookup,
            RouterError::Config(_)
            | RouterError::Wallet(_)
            | RouterError::Json(_)
            | RouterError::Io(_) => ErrorKind::Configuration,
        }
    }

    /// Validation errors always abort the signal; everything else is
    /// recoverable by the caller.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Validation
    }
}

/// Specific error types for inbound signal validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Ticker must be denominated in USD: {ticker}")]
    InvalidTicker { ticker: String },

    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("unknown {kind} `{value}`")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    InvalidNumber { field: &'static str, reason: String },

    #[error("malformed signal: {0}")]
    Malformed(String),
}
