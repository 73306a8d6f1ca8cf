pub mod amount;
pub mod auth;
pub mod credit;
pub mod decimals;
pub mod engine;
pub mod quote;
pub mod source;
pub mod status;
pub mod throttle;
pub mod token_sync;

pub use engine::{ErrorKind, QuoteRequest, SwapEngine, SwapEngineError, SwapIntent};
pub use source::okx::OkxDexClient;
