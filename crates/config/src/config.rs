use derive_more::{Display, From};
use serde::Deserialize;
use serde_valid::yaml::FromYamlStr;
use serde_valid::Validate;

// Config Type
#[derive(Debug)]
pub struct Config {
    // OKX DEX aggregator API configuration
    pub okx: OkxConfig,
    // Delegated credit scorer configuration
    pub scorer: ScorerConfig,
    // Rate limiter / memoization configuration for upstream calls
    pub cache: CacheConfig,
    // Infra Dependencies
    pub infra: InfraConfig,
    // API Server Configuration
    pub server: ServerConfig,
    // Configuration for the token list indexer
    pub token_sync: TokenSyncConfig,
}

impl Config {
    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let config_file_content = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&config_file_content)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let raw_config = RawConfig::from_yaml_str(s)?;

        Ok(Config {
            okx: raw_config.okx,
            scorer: raw_config.scorer,
            cache: raw_config.cache,
            infra: raw_config.infra,
            server: raw_config.server,
            token_sync: raw_config.token_sync,
        })
    }
}

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("Serde Error: {}", _0)]
    SerdeError(serde_valid::Error<serde_yaml::Error>),

    #[display("Error Reading Config File: {}", _0)]
    IoError(std::io::Error),
}

// Intermediate Config Type as Deserialization Target
#[derive(Debug, Deserialize, Validate)]
pub struct RawConfig {
    #[validate]
    pub okx: OkxConfig,
    #[validate]
    pub scorer: ScorerConfig,
    #[validate]
    pub cache: CacheConfig,
    #[validate]
    pub infra: InfraConfig,
    #[validate]
    pub server: ServerConfig,
    #[validate]
    pub token_sync: TokenSyncConfig,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OkxConfig {
    // The base URL of the OKX exchange API (aggregator quote, trade order)
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub base_url: String,

    // The base URL of the OKX web3 API (dex aggregator, cross-chain)
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub web3_base_url: String,

    // Bounded timeout applied to every upstream request
    #[validate(minimum = 1)]
    pub request_timeout_sec: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScorerConfig {
    // The base URL of the delegated AI credit scorer
    #[validate(
        pattern = r"https?:\/\/[-a-zA-Z0-9@:%._\+~#=]{1,256}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CacheConfig {
    // Time to live of a memoized upstream result
    #[validate(minimum = 1)]
    pub ttl_sec: u64,

    // Minimum spacing between two upstream calls, applied process-wide
    #[validate(minimum = 1)]
    pub min_interval_ms: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InfraConfig {
    // The URL of the MongoDB holding the token registry
    #[validate(pattern = r"mongodb://[-a-zA-Z0-9@:%._\+~#=]{1,256}")]
    pub mongo_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServerConfig {
    // The port the server will listen on
    #[validate(minimum = 1)]
    pub port: u16,

    // The host the server will listen on
    #[validate(min_length = 1)]
    pub host: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct TokenSyncConfig {
    // Chain indices whose token lists are fetched into the registry
    #[validate(unique_items)]
    #[validate(min_items = 1)]
    pub chain_indices: Vec<u32>,

    // Delay between per-chain token list fetches, honoring the upstream rate limit
    #[validate(minimum = 1)]
    pub fetch_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, ConfigError};
    use crate::get_sample_config;

    #[test]
    fn test_config_parsing() {
        get_sample_config();
    }

    #[test]
    fn test_should_reject_invalid_mongo_url() {
        let config = r#"
okx:
    base_url: 'https://www.okx.com'
    web3_base_url: 'https://web3.okx.com'
    request_timeout_sec: 10
scorer:
    base_url: 'http://localhost:4001'
cache:
    ttl_sec: 60
    min_interval_ms: 1000
infra:
    mongo_url: 'postgres://localhost:5432'
server:
    port: 4000
    host: 'localhost'
token_sync:
    chain_indices: [1, 56]
    fetch_delay_ms: 1200
"#;
        assert!(matches!(Config::from_yaml_str(config).unwrap_err(), ConfigError::SerdeError(_)));
    }

    #[test]
    fn test_should_reject_duplicate_chain_indices() {
        let config = r#"
okx:
    base_url: 'https://www.okx.com'
    web3_base_url: 'https://web3.okx.com'
    request_timeout_sec: 10
scorer:
    base_url: 'http://localhost:4001'
cache:
    ttl_sec: 60
    min_interval_ms: 1000
infra:
    mongo_url: 'mongodb://localhost:27017'
server:
    port: 4000
    host: 'localhost'
token_sync:
    chain_indices: [1, 1]
    fetch_delay_ms: 1200
"#;
        assert_eq!(
            if let ConfigError::SerdeError(err) = Config::from_yaml_str(config).unwrap_err() {
                err.as_validation_errors().is_some()
            } else {
                false
            },
            true
        );
    }
}
