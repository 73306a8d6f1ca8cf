use log::{error, info};
use thiserror::Error;
use tokio::time::{sleep, Duration};

use config::TokenSyncConfig;
use storage::{Token, TokenRegistry};

use crate::decimals::DEFAULT_DECIMALS;
use crate::source::TokenListSource;

/// Refreshes the token registry from the aggregator's per-chain token
/// lists. Runs to completion once per invocation; scheduling is the
/// caller's concern.
pub struct TokenIndexer<'config, Source: TokenListSource, Registry: TokenRegistry> {
    config: &'config TokenSyncConfig,
    source: &'config Source,
    registry: &'config Registry,
}

impl<'config, Source: TokenListSource, Registry: TokenRegistry>
    TokenIndexer<'config, Source, Registry>
{
    pub fn new(
        config: &'config TokenSyncConfig,
        source: &'config Source,
        registry: &'config Registry,
    ) -> Self {
        TokenIndexer { config, source, registry }
    }

    /// Fetches every configured chain, upserting each token into the
    /// registry. Per-chain failures are logged and skipped; the run only
    /// fails when no chain could be synced at all.
    pub async fn run(&self) -> Result<usize, TokenIndexerError<Source>> {
        info!("Running token sync for {} chains", self.config.chain_indices.len());

        let mut upserted = 0usize;
        let mut failed_chains = 0usize;
        for (i, chain_index) in self.config.chain_indices.iter().enumerate() {
            if i > 0 {
                // Spacing required by the upstream rate limit
                sleep(Duration::from_millis(self.config.fetch_delay_ms)).await;
            }

            let chain = chain_index.to_string();
            match self.sync_chain(&chain).await {
                Ok(count) => {
                    info!("Upserted {} tokens for chain {}", count, chain);
                    upserted += count;
                }
                Err(err) => {
                    error!("Token sync failed for chain {}: {}", chain, err);
                    failed_chains += 1;
                }
            }
        }

        if failed_chains == self.config.chain_indices.len() {
            return Err(TokenIndexerError::AllChainsFailed);
        }
        Ok(upserted)
    }

    async fn sync_chain(&self, chain: &str) -> Result<usize, TokenIndexerError<Source>> {
        let entries = self
            .source
            .token_list(chain)
            .await
            .map_err(TokenIndexerError::TokenListError)?;

        let mut count = 0usize;
        for entry in entries {
            let token = Token {
                symbol: entry.token_symbol,
                name: entry.token_name,
                chain: chain.to_string(),
                address: entry.token_contract_address.to_lowercase(),
                decimals: entry.decimals.parse().unwrap_or(DEFAULT_DECIMALS),
                logo_url: entry.token_logo_url,
            };
            match self.registry.upsert_token(&token).await {
                Ok(()) => count += 1,
                Err(err) => {
                    error!("Failed to upsert token {} on chain {}: {}", token.symbol, chain, err)
                }
            }
        }
        Ok(count)
    }
}

#[derive(Debug, Error)]
pub enum TokenIndexerError<Source: TokenListSource> {
    #[error("Token list fetch failed: {0}")]
    TokenListError(Source::Error),

    #[error("Token sync failed for every configured chain")]
    AllChainsFailed,
}
