use std::error::Error;
use std::fmt::Debug;

pub use okx::OkxDexClient;

pub mod okx;

use crate::source::okx::types::TokenListEntry;

/// Per-chain token metadata source, consumed by the decimal resolver and the
/// token list indexer.
pub trait TokenListSource: Debug {
    type Error: Error + Debug;

    async fn token_list(&self, chain: &str) -> Result<Vec<TokenListEntry>, Self::Error>;
}
