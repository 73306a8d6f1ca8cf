use async_trait::async_trait;
use derive_more::Display;
use futures::stream::TryStreamExt;
use log::debug;
use mongodb::{
    bson::{self, doc, Document},
    options::{IndexOptions, UpdateOptions},
    Client, Collection,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{Token, TokenRegistry};

#[derive(Debug, Display, Clone)]
#[display(
    "MongoDBClient {{ client: {:?}, db_name: {}, collection_name: {} }}",
    client,
    db_name,
    collection_name
)]
pub struct MongoDBClient {
    pub client: Client,
    db_name: String,
    collection_name: String,
}

impl MongoDBClient {
    pub async fn new(
        mongodb_uri: &str,
        db_name: String,
        collection_name: String,
        create_indexes: bool,
    ) -> Result<Self, DBError> {
        let client = mongodb::Client::with_uri_str(mongodb_uri).await?;
        let provider = Self { client, db_name, collection_name };
        if create_indexes {
            provider.create_indexes().await?;
        }
        Ok(provider)
    }

    pub fn get_collection(&self) -> Collection<Document> {
        self.client.database(&self.db_name).collection(&self.collection_name)
    }

    async fn create_indexes(&self) -> Result<(), DBError> {
        let collection: Collection<Document> = self.get_collection();
        let model = mongodb::IndexModel::builder()
            .keys(doc! { "address": 1, "chain": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(model, None).await?;
        Ok(())
    }

    pub fn to_document<T: Serialize>(&self, item: &T) -> Result<Document, DBError> {
        let doc = bson::to_bson(item)?
            .as_document()
            .cloned()
            .ok_or_else(|| DBError::Other("Failed to convert item to BSON document".to_string()))?;
        Ok(doc)
    }

    pub fn from_document<T: DeserializeOwned>(&self, doc: Document) -> Result<T, DBError> {
        let item = bson::from_bson(bson::Bson::Document(doc))?;
        Ok(item)
    }
}

#[async_trait]
impl TokenRegistry for MongoDBClient {
    type Error = DBError;

    async fn find_token(&self, address: &str, chain: &str) -> Result<Option<Token>, DBError> {
        let query = doc! { "address": address.to_lowercase(), "chain": chain };
        let result = self.get_collection().find_one(query, None).await?;
        match result {
            Some(document) => Ok(Some(self.from_document(document)?)),
            None => Ok(None),
        }
    }

    async fn upsert_token(&self, token: &Token) -> Result<(), DBError> {
        let mut token = token.clone();
        token.address = token.address.to_lowercase();

        debug!("Upserting token {} on chain {}", token.symbol, token.chain);

        let query = doc! { "address": &token.address, "chain": &token.chain };
        let update = doc! { "$set": self.to_document(&token)? };
        self.get_collection()
            .update_one(query, update, UpdateOptions::builder().upsert(true).build())
            .await?;
        Ok(())
    }

    async fn tokens(&self, chain: Option<&str>) -> Result<Vec<Token>, DBError> {
        let query = match chain {
            Some(chain) => doc! { "chain": chain },
            None => Document::new(),
        };

        let mut cursor = self.get_collection().find(query, None).await?;
        let mut tokens = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            tokens.push(self.from_document(document)?);
        }
        Ok(tokens)
    }

    async fn chains(&self) -> Result<Vec<String>, DBError> {
        let values = self.get_collection().distinct("chain", None, None).await?;
        Ok(values.into_iter().filter_map(|value| value.as_str().map(str::to_string)).collect())
    }
}

#[derive(Error, Debug)]
pub enum DBError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Other error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use crate::mongodb_client::{DBError, MongoDBClient};
    use crate::Token;

    const DB_URI: &str = "mongodb://localhost:27017";

    fn sample_token() -> Token {
        Token {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            chain: "1".to_string(),
            address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            decimals: 6,
            logo_url: Some("https://static.okx.com/usdc.png".to_string()),
        }
    }

    // Document conversion is pure; the client never connects until a query runs.
    #[tokio::test]
    async fn test_token_document_roundtrip() -> Result<(), DBError> {
        let provider =
            MongoDBClient::new(DB_URI, "test_db".to_string(), "tokens".to_string(), false).await?;

        let token = sample_token();
        let document = provider.to_document(&token)?;
        assert_eq!(document.get_str("symbol").unwrap(), "USDC");
        assert_eq!(document.get_i32("decimals").unwrap(), 6);

        let restored: Token = provider.from_document(document)?;
        assert_eq!(restored, token);
        Ok(())
    }

    #[tokio::test]
    async fn test_registry_query_shape() -> Result<(), DBError> {
        let provider =
            MongoDBClient::new(DB_URI, "test_db".to_string(), "tokens".to_string(), false).await?;

        let token = sample_token();
        let document = provider.to_document(&token)?;
        let query = doc! { "address": &token.address, "chain": &token.chain };
        assert_eq!(query.get_str("chain").unwrap(), document.get_str("chain").unwrap());
        Ok(())
    }
}
