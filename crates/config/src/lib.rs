pub mod config;

pub use config::{
    CacheConfig, Config, ConfigError, InfraConfig, OkxConfig, ScorerConfig, ServerConfig,
    TokenSyncConfig,
};

pub fn get_sample_config() -> Config {
    Config::from_file("../../config.yaml.example").unwrap()
}
