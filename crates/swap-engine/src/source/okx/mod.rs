use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use thiserror::Error;

use config::OkxConfig;

use crate::auth::{Credentials, SignatureError};
use crate::source::TokenListSource;
use types::{
    AddressTransactionPage, BridgeToken, BuildTxData, BuildTxParams, CrossChainQuote,
    CrossChainQuoteParams, OkxResponse, SameChainQuote, SwapParams, TokenListEntry, TradeOrder,
    TransactionHistory,
};

pub mod types;

/// Signed client for the OKX DEX aggregator. Quote and trade-order calls go
/// to the exchange host, everything dex/cross-chain to the web3 host.
#[derive(Debug, Clone)]
pub struct OkxDexClient {
    client: reqwest::Client,
    base_url: String,
    web3_base_url: String,
    credentials: Credentials,
}

impl OkxDexClient {
    pub fn new(config: &OkxConfig, credentials: Credentials) -> Result<Self, OkxClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .build()?;

        Ok(OkxDexClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            web3_base_url: config.web3_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Signs and issues a GET. `request_path` must be the exact path and
    /// query string sent on the wire: the signature covers it byte for byte
    /// and any mismatch fails upstream authentication.
    async fn get_signed<T: DeserializeOwned>(
        &self,
        base_url: &str,
        request_path: &str,
    ) -> Result<OkxResponse<T>, OkxClientError> {
        let headers = self.credentials.signed_headers("GET", request_path, "")?;

        debug!("GET {}{}", base_url, request_path);
        let response =
            self.client.get(format!("{}{}", base_url, request_path)).headers(headers).send().await?;
        let raw_text = response.text().await?;

        serde_json::from_str(&raw_text)
            .map_err(|err| OkxClientError::DeserializationError(raw_text, err))
    }

    pub async fn quote(
        &self,
        chain_id: &str,
        from_token_address: &str,
        to_token_address: &str,
        amount: &str,
    ) -> Result<OkxResponse<SameChainQuote>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/aggregator/quote?chainId={}&fromTokenAddress={}&toTokenAddress={}&amount={}",
            chain_id, from_token_address, to_token_address, amount
        );
        self.get_signed(&self.base_url, &request_path).await
    }

    pub async fn swap(
        &self,
        params: &SwapParams,
    ) -> Result<OkxResponse<serde_json::Value>, OkxClientError> {
        self.get_signed(&self.web3_base_url, &Self::swap_request_path("swap", params)).await
    }

    pub async fn swap_instruction(
        &self,
        params: &SwapParams,
    ) -> Result<OkxResponse<serde_json::Value>, OkxClientError> {
        self.get_signed(&self.web3_base_url, &Self::swap_request_path("swap-instruction", params))
            .await
    }

    fn swap_request_path(endpoint: &str, params: &SwapParams) -> String {
        format!(
            "/api/v5/dex/aggregator/{}?chainIndex={}&fromTokenAddress={}&toTokenAddress={}&amount={}&slippage={}&userWalletAddress={}",
            endpoint,
            params.chain_index,
            params.from_token_address,
            params.to_token_address,
            params.amount,
            params.slippage,
            params.user_wallet_address
        )
    }

    pub async fn approve_transaction(
        &self,
        chain_index: &str,
        token_contract_address: &str,
        approve_amount: &str,
    ) -> Result<OkxResponse<serde_json::Value>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/aggregator/approve-transaction?chainIndex={}&tokenContractAddress={}&approveAmount={}",
            chain_index, token_contract_address, approve_amount
        );
        self.get_signed(&self.web3_base_url, &request_path).await
    }

    pub async fn transaction_history(
        &self,
        chain_index: &str,
        tx_hash: &str,
    ) -> Result<OkxResponse<TransactionHistory>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/aggregator/history?chainIndex={}&txHash={}",
            chain_index, tx_hash
        );
        self.get_signed(&self.web3_base_url, &request_path).await
    }

    pub async fn all_tokens(
        &self,
        chain_index: &str,
    ) -> Result<OkxResponse<TokenListEntry>, OkxClientError> {
        let request_path =
            format!("/api/v5/dex/aggregator/all-tokens?chainIndex={}", chain_index);
        self.get_signed(&self.web3_base_url, &request_path).await
    }

    pub async fn cross_chain_quote(
        &self,
        params: &CrossChainQuoteParams,
    ) -> Result<OkxResponse<CrossChainQuote>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/cross-chain/quote?fromChainIndex={}&toChainIndex={}&fromTokenAddress={}&toTokenAddress={}&amount={}&slippage={}",
            params.from_chain_index,
            params.to_chain_index,
            params.from_token_address,
            params.to_token_address,
            params.amount,
            params.slippage
        );
        self.get_signed(&self.web3_base_url, &request_path).await
    }

    pub async fn cross_chain_route(
        &self,
        params: &CrossChainQuoteParams,
    ) -> Result<OkxResponse<serde_json::Value>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/cross-chain/route?fromChainId={}&toChainId={}&fromTokenAddress={}&toTokenAddress={}&amount={}",
            params.from_chain_index,
            params.to_chain_index,
            params.from_token_address,
            params.to_token_address,
            params.amount
        );
        self.get_signed(&self.web3_base_url, &request_path).await
    }

    /// `sort=1` asks upstream for the optimal route after netting received
    /// amount, network fees, slippage and bridge cost.
    pub async fn cross_chain_build_tx(
        &self,
        params: &BuildTxParams,
    ) -> Result<OkxResponse<BuildTxData>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/cross-chain/build-tx?fromChainIndex={}&toChainIndex={}&fromTokenAddress={}&toTokenAddress={}&amount={}&slippage={}&userWalletAddress={}&receiveAddress={}&sort=1",
            params.from_chain_index,
            params.to_chain_index,
            params.from_token_address,
            params.to_token_address,
            params.amount,
            params.slippage,
            params.user_wallet_address,
            params.receive_address
        );
        self.get_signed(&self.web3_base_url, &request_path).await
    }

    pub async fn supported_bridge_tokens(
        &self,
    ) -> Result<OkxResponse<BridgeToken>, OkxClientError> {
        self.get_signed(&self.web3_base_url, "/api/v5/dex/cross-chain/supported/tokens").await
    }

    pub async fn trade_order(
        &self,
        ord_id: &str,
    ) -> Result<OkxResponse<TradeOrder>, OkxClientError> {
        let request_path = format!("/api/v5/trade/order?ordId={}", ord_id);
        self.get_signed(&self.base_url, &request_path).await
    }

    pub async fn transactions_by_address(
        &self,
        address: &str,
        chains: &str,
        limit: u32,
    ) -> Result<OkxResponse<AddressTransactionPage>, OkxClientError> {
        let request_path = format!(
            "/api/v5/dex/post-transaction/transactions-by-address?address={}&chains={}&limit={}",
            address, chains, limit
        );
        self.get_signed(&self.web3_base_url, &request_path).await
    }
}

impl TokenListSource for OkxDexClient {
    type Error = OkxClientError;

    async fn token_list(&self, chain: &str) -> Result<Vec<TokenListEntry>, OkxClientError> {
        let response = self.all_tokens(chain).await?;
        if !response.is_ok() {
            return Err(OkxClientError::FailureIndicatedInResponse(response.code, response.msg));
        }
        Ok(response.data)
    }
}

#[derive(Debug, Error)]
pub enum OkxClientError {
    #[error("Error while making request: {0}")]
    ApiCallError(#[from] reqwest::Error),

    #[error("Deserialization Error - Original String {0}, Error {1}")]
    DeserializationError(String, serde_json::Error),

    #[error("Failure indicated in OKX response: code {0}, msg {1}")]
    FailureIndicatedInResponse(String, String),

    #[error("Signature error: {0}")]
    SignatureError(#[from] SignatureError),
}
