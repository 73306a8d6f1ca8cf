use log::warn;

use storage::TokenRegistry;

use crate::source::TokenListSource;

/// The common on-chain default, used only when every lookup tier is
/// exhausted.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Resolves a token's decimal precision through a tiered fallback: the
/// registry first, the aggregator's per-chain token list second, 18 last.
#[derive(Debug)]
pub struct DecimalResolver<'a, Registry: TokenRegistry, Source: TokenListSource> {
    registry: &'a Registry,
    token_list: &'a Source,
}

impl<'a, Registry: TokenRegistry, Source: TokenListSource> DecimalResolver<'a, Registry, Source> {
    pub fn new(registry: &'a Registry, token_list: &'a Source) -> Self {
        DecimalResolver { registry, token_list }
    }

    /// Never fails: a tier that errors or misses degrades to the next one.
    pub async fn resolve(&self, token_address: &str, chain: &str) -> u8 {
        if let Some(decimals) = self.from_registry(token_address, chain).await {
            return decimals;
        }
        if let Some(decimals) = self.from_token_list(token_address, chain).await {
            return decimals;
        }
        warn!(
            "Decimals not found for token {} on chain {}, defaulting to {}",
            token_address, chain, DEFAULT_DECIMALS
        );
        DEFAULT_DECIMALS
    }

    async fn from_registry(&self, token_address: &str, chain: &str) -> Option<u8> {
        match self.registry.find_token(token_address, chain).await {
            Ok(Some(token)) => Some(token.decimals),
            Ok(None) => None,
            Err(err) => {
                warn!(
                    "Token registry lookup failed for {} on chain {}: {}",
                    token_address, chain, err
                );
                None
            }
        }
    }

    async fn from_token_list(&self, token_address: &str, chain: &str) -> Option<u8> {
        match self.token_list.token_list(chain).await {
            Ok(tokens) => tokens
                .iter()
                .find(|token| token.token_contract_address.eq_ignore_ascii_case(token_address))
                .and_then(|token| token.decimals.parse().ok()),
            Err(err) => {
                warn!("Token list fetch failed for chain {}: {}", chain, err);
                None
            }
        }
    }
}
