pub mod intent;
pub mod position;
pub mod precision;
pub mod ticker;

pub use intent::*;
pub use position::*;
