pub mod hyperliquid;
pub mod paper;
pub mod size_decimals;

pub use hyperliquid::HyperliquidGateway;
pub use paper::{PaperGateway, RestingOrder};
pub use size_decimals::{SizeDecimals, SizeDecimalsSource, DEFAULT_SIZE_DECIMALS};
