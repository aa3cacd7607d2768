pub mod factory;
mod traits;

pub use factory::{build_gateway, build_gateway_for};
pub use traits::{parse_exchange_kind, ExchangeGateway, ExchangeKind, OrderResult, OrderStatus};
