use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use mongodb_client::{DBError, MongoDBClient};

pub mod mongodb_client;

/// A token known to the registry, keyed by `(address, chain)`.
///
/// Addresses are stored lowercase so lookups are case insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub chain: String,
    pub address: String,
    pub decimals: u8,
    pub logo_url: Option<String>,
}

/// Read/write registry of token metadata.
///
/// Written by the token list indexer, read by the decimal resolver.
#[async_trait]
pub trait TokenRegistry: Debug + Send + Sync {
    type Error: std::error::Error + Debug + Send + Sync;

    async fn find_token(&self, address: &str, chain: &str) -> Result<Option<Token>, Self::Error>;

    async fn upsert_token(&self, token: &Token) -> Result<(), Self::Error>;

    async fn tokens(&self, chain: Option<&str>) -> Result<Vec<Token>, Self::Error>;

    async fn chains(&self) -> Result<Vec<String>, Self::Error>;
}
