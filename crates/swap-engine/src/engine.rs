use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storage::TokenRegistry;

use crate::amount::{self, AmountError};
use crate::decimals::DecimalResolver;
use crate::quote::{normalize_cross_chain, normalize_same_chain, Quote, QuoteError};
use crate::source::okx::types::{
    BridgeRouter, BuildTxParams, CrossChainQuoteParams, SwapParams, TransactionHistory,
};
use crate::source::okx::{OkxClientError, OkxDexClient};
use crate::status::TransactionStatus;

/// Chains whose swap payloads come from the EVM calldata endpoint; every
/// other chain uses the instruction-style endpoint.
const EVM_CHAIN_INDICES: [&str; 7] = ["1", "66", "42161", "137", "10", "56", "43114"];

pub const DEFAULT_SWAP_SLIPPAGE: &str = "0.5";
pub const DEFAULT_BRIDGE_SLIPPAGE: &str = "0.01";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub from_chain: String,
    pub to_chain: String,
    pub from_token: String,
    pub to_token: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub slippage: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapIntent {
    pub from_chain: String,
    pub to_chain: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    #[serde(default)]
    pub slippage: Option<String>,
    pub user_wallet_address: String,
    #[serde(default)]
    pub receive_address: Option<String>,
    /// Decimals of the source token as carried by the quote the caller is
    /// executing against; resolved again when absent.
    #[serde(default)]
    pub from_token_decimals: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeBuild {
    pub tx_data: serde_json::Value,
    pub bridge_info: Option<BridgeRouter>,
    pub from_token_amount: Option<String>,
    pub to_token_amount: Option<String>,
    pub minimum_receive: Option<String>,
}

#[derive(Debug, Error)]
pub enum SwapEngineError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Client(#[from] OkxClientError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Aggregator error: {0}")]
    Upstream(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No transaction data returned by the aggregator")]
    MissingTransactionData,
}

/// Coarse classification consumed by the HTTP layer for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Upstream,
    NotFound,
    Internal,
}

impl SwapEngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SwapEngineError::Validation(_) | SwapEngineError::Amount(_) => ErrorKind::Validation,
            SwapEngineError::Quote(QuoteError::NoRouteFound) => ErrorKind::NotFound,
            SwapEngineError::NotFound(_) => ErrorKind::NotFound,
            SwapEngineError::Client(OkxClientError::SignatureError(_)) => ErrorKind::Internal,
            SwapEngineError::Quote(QuoteError::Upstream(_))
            | SwapEngineError::Client(_)
            | SwapEngineError::Upstream(_)
            | SwapEngineError::MissingTransactionData => ErrorKind::Upstream,
        }
    }
}

/// Sequences the swap lifecycle against the aggregator: quote, approval,
/// swap/bridge transaction construction, status. Holds no state between
/// steps; every call is independently resumable from what the caller passes
/// back in.
#[derive(Debug)]
pub struct SwapEngine<Registry: TokenRegistry> {
    client: OkxDexClient,
    registry: Arc<Registry>,
}

impl<Registry: TokenRegistry> SwapEngine<Registry> {
    pub fn new(client: OkxDexClient, registry: Arc<Registry>) -> Self {
        SwapEngine { client, registry }
    }

    pub fn is_evm_chain(chain_index: &str) -> bool {
        EVM_CHAIN_INDICES.contains(&chain_index)
    }

    fn resolver(&self) -> DecimalResolver<'_, Registry, OkxDexClient> {
        DecimalResolver::new(self.registry.as_ref(), &self.client)
    }

    /// Same-chain quote. Yields one canonical quote per compared route, best
    /// first. Cross-chain pairs are rejected before anything goes upstream.
    pub async fn same_chain_quotes(
        &self,
        request: &QuoteRequest,
    ) -> Result<Vec<Quote>, SwapEngineError> {
        require_field(&request.from_chain, "fromChain")?;
        require_field(&request.to_chain, "toChain")?;
        require_field(&request.from_token, "fromToken")?;
        require_field(&request.to_token, "toToken")?;
        if request.from_chain != request.to_chain {
            return Err(SwapEngineError::Validation(
                "Cross-chain quotes are not supported on the same-chain endpoint".to_string(),
            ));
        }

        // Token selectors may arrive as `address-chain` composites from the UI
        let from_token_address = composite_address(&request.from_token);
        let to_token_address = composite_address(&request.to_token);

        let requested_amount = request.amount.as_deref();
        let amount_in = if amount::is_price_probe(requested_amount) {
            // Price probe: quote 1 minimal unit, the upstream convention when
            // no amount was given. Execution never reuses this sentinel.
            amount::PRICE_PROBE_MINIMAL_UNITS.to_string()
        } else {
            let decimals = self.resolver().resolve(from_token_address, &request.from_chain).await;
            amount::to_minimal_units(requested_amount.unwrap_or_default(), decimals)?
        };

        debug!(
            "Same-chain quote on chain {}: {} -> {} amount {}",
            request.from_chain, from_token_address, to_token_address, amount_in
        );
        let response = self
            .client
            .quote(&request.from_chain, from_token_address, to_token_address, &amount_in)
            .await?;
        Ok(normalize_same_chain(&response)?)
    }

    /// Cross-chain quote. Equal source and destination chains are allowed
    /// here; the equality precondition only applies to the same-chain path.
    pub async fn cross_chain_quote(
        &self,
        request: &QuoteRequest,
    ) -> Result<Quote, SwapEngineError> {
        require_field(&request.from_chain, "fromChain")?;
        require_field(&request.to_chain, "toChain")?;
        require_field(&request.from_token, "fromToken")?;
        require_field(&request.to_token, "toToken")?;
        let amount =
            request.amount.as_deref().ok_or_else(|| missing_field_error("amount"))?;
        require_field(amount, "amount")?;

        let decimals = self.resolver().resolve(&request.from_token, &request.from_chain).await;
        let params = CrossChainQuoteParams {
            from_chain_index: request.from_chain.clone(),
            to_chain_index: request.to_chain.clone(),
            from_token_address: request.from_token.clone(),
            to_token_address: request.to_token.clone(),
            amount: amount::to_minimal_units(amount, decimals)?,
            slippage: request
                .slippage
                .clone()
                .unwrap_or_else(|| DEFAULT_BRIDGE_SLIPPAGE.to_string()),
        };

        let response = self.client.cross_chain_quote(&params).await?;
        Ok(normalize_cross_chain(&response)?)
    }

    /// Approval step, callable independently of the swap. The payload is
    /// handed back unchanged; signing and broadcast stay with the caller.
    pub async fn approval_transaction(
        &self,
        chain_index: &str,
        token_contract_address: &str,
        approve_amount: &str,
    ) -> Result<Vec<serde_json::Value>, SwapEngineError> {
        require_field(chain_index, "chainIndex")?;
        require_field(token_contract_address, "tokenContractAddress")?;
        require_field(approve_amount, "approveAmount")?;

        let response = self
            .client
            .approve_transaction(chain_index, token_contract_address, approve_amount)
            .await?;
        if !response.is_ok() {
            return Err(SwapEngineError::Upstream(response.msg));
        }
        Ok(response.data)
    }

    /// Builds the unsigned same-chain swap transaction. The endpoint depends
    /// on the source chain: EVM chains get calldata, everything else gets
    /// instructions.
    pub async fn build_swap(
        &self,
        intent: &SwapIntent,
    ) -> Result<Vec<serde_json::Value>, SwapEngineError> {
        validate_intent(intent)?;

        let from_token_address = composite_address(&intent.from_token);
        let to_token_address = composite_address(&intent.to_token);
        let decimals = match intent.from_token_decimals {
            Some(decimals) => decimals,
            None => self.resolver().resolve(from_token_address, &intent.from_chain).await,
        };

        let params = SwapParams {
            chain_index: intent.from_chain.clone(),
            from_token_address: from_token_address.to_string(),
            to_token_address: to_token_address.to_string(),
            amount: amount::to_minimal_units(&intent.amount, decimals)?,
            slippage: intent
                .slippage
                .clone()
                .unwrap_or_else(|| DEFAULT_SWAP_SLIPPAGE.to_string()),
            user_wallet_address: intent.user_wallet_address.clone(),
        };

        info!(
            "Building swap on chain {} for wallet {}",
            intent.from_chain, intent.user_wallet_address
        );
        let response = if Self::is_evm_chain(&intent.from_chain) {
            self.client.swap(&params).await?
        } else {
            self.client.swap_instruction(&params).await?
        };

        if !response.is_ok() {
            return Err(SwapEngineError::Upstream(response.msg));
        }
        if response.data.is_empty() {
            return Err(SwapEngineError::MissingTransactionData);
        }
        Ok(response.data)
    }

    /// Builds the unsigned bridge transaction through the cross-chain
    /// build-tx endpoint, always requesting the optimal route.
    pub async fn build_bridge(&self, intent: &SwapIntent) -> Result<BridgeBuild, SwapEngineError> {
        validate_intent(intent)?;

        let decimals = match intent.from_token_decimals {
            Some(decimals) => decimals,
            None => self.resolver().resolve(&intent.from_token, &intent.from_chain).await,
        };

        // Funds land at the sending wallet unless the caller directed otherwise
        let receive_address = intent
            .receive_address
            .clone()
            .filter(|address| !address.trim().is_empty())
            .unwrap_or_else(|| intent.user_wallet_address.clone());

        let params = BuildTxParams {
            from_chain_index: intent.from_chain.clone(),
            to_chain_index: intent.to_chain.clone(),
            from_token_address: intent.from_token.clone(),
            to_token_address: intent.to_token.clone(),
            amount: amount::to_minimal_units(&intent.amount, decimals)?,
            slippage: intent
                .slippage
                .clone()
                .unwrap_or_else(|| DEFAULT_BRIDGE_SLIPPAGE.to_string()),
            user_wallet_address: intent.user_wallet_address.clone(),
            receive_address,
        };

        info!(
            "Building bridge tx {} -> {} for wallet {}",
            intent.from_chain, intent.to_chain, intent.user_wallet_address
        );
        let response = self.client.cross_chain_build_tx(&params).await?;
        if !response.is_ok() {
            return Err(SwapEngineError::Upstream(response.msg));
        }

        let data =
            response.data.into_iter().next().ok_or(SwapEngineError::MissingTransactionData)?;
        let tx_data = data.tx.ok_or(SwapEngineError::MissingTransactionData)?;

        Ok(BridgeBuild {
            tx_data,
            bridge_info: data.router,
            from_token_amount: data.from_token_amount,
            to_token_amount: data.to_token_amount,
            minimum_receive: data.minimum_receive,
        })
    }

    /// One state fetch per invocation; callers drive the polling interval.
    pub async fn bridge_order_status(
        &self,
        ord_id: &str,
    ) -> Result<TransactionStatus, SwapEngineError> {
        require_field(ord_id, "txHash")?;

        let response = self.client.trade_order(ord_id).await?;
        if !response.is_ok() {
            return Err(SwapEngineError::Upstream(response.msg));
        }
        let state =
            response.data.first().and_then(|order| order.state.as_deref()).unwrap_or_default();
        Ok(TransactionStatus::from_order_state(state))
    }

    /// Same-chain transaction record from the aggregator history endpoint.
    pub async fn transaction_history(
        &self,
        chain_index: &str,
        tx_hash: &str,
    ) -> Result<TransactionHistory, SwapEngineError> {
        require_field(chain_index, "chainIndex")?;
        require_field(tx_hash, "txHash")?;

        let response = self.client.transaction_history(chain_index, tx_hash).await?;
        if !response.is_ok() {
            return Err(SwapEngineError::Upstream(response.msg));
        }
        response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| SwapEngineError::NotFound(format!("No history for tx {}", tx_hash)))
    }
}

/// `0x` followed by exactly 40 hex characters.
pub fn is_valid_wallet_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

fn validate_intent(intent: &SwapIntent) -> Result<(), SwapEngineError> {
    require_field(&intent.from_chain, "fromChain")?;
    require_field(&intent.to_chain, "toChain")?;
    require_field(&intent.from_token, "fromToken")?;
    require_field(&intent.to_token, "toToken")?;
    require_field(&intent.amount, "amount")?;
    require_field(&intent.user_wallet_address, "userWalletAddress")?;
    if !is_valid_wallet_address(&intent.user_wallet_address) {
        return Err(SwapEngineError::Validation(format!(
            "Invalid wallet address format: {}",
            intent.user_wallet_address
        )));
    }
    Ok(())
}

fn require_field(value: &str, name: &str) -> Result<(), SwapEngineError> {
    if value.trim().is_empty() {
        return Err(missing_field_error(name));
    }
    Ok(())
}

fn missing_field_error(name: &str) -> SwapEngineError {
    SwapEngineError::Validation(format!("Missing required field: {}", name))
}

fn composite_address(token: &str) -> &str {
    token.split('-').next().unwrap_or(token)
}
