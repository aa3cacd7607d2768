pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod routing;
pub mod services;
pub mod signing;

pub use config::AppConfig;
pub use domain::{ActionKind, OrderIntent, PositionState, SignalPayload};
pub use error::{ErrorKind, Result, RouterError, ValidationError};
pub use exchange::{ExchangeGateway, ExchangeKind, OrderResult, OrderStatus};
pub use routing::{OrderRouter, RouteOutcome, RouterOptions, Transition};
pub use signing::Wallet;
