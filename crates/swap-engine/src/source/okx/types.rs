use serde::{Deserialize, Serialize};

/// Envelope wrapping every aggregator response. `code` is `"0"` on success;
/// error payloads carry `msg` and an empty `data` array.
#[derive(Debug, Clone, Deserialize)]
pub struct OkxResponse<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> OkxResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.code == "0"
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListEntry {
    pub token_symbol: String,
    pub token_name: String,
    pub token_contract_address: String,
    /// Decimal count, reported as a string on the wire.
    pub decimals: String,
    #[serde(default)]
    pub token_logo_url: Option<String>,
}

/// Token description attached to quote payloads. The field is `decimal`,
/// singular, on this shape only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteTokenInfo {
    pub token_contract_address: String,
    pub token_symbol: String,
    pub decimal: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SameChainQuote {
    pub from_token: QuoteTokenInfo,
    pub to_token: QuoteTokenInfo,
    pub from_token_amount: String,
    pub to_token_amount: String,
    #[serde(default)]
    pub dex_router_list: Vec<DexRouter>,
    #[serde(default)]
    pub quote_compare_list: Vec<RouteComparison>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DexRouter {
    /// Composite `contract--name[--name]` string; the contract address is
    /// the part before the first `--` delimiter.
    pub router: String,
    pub router_percent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteComparison {
    pub router_name: Option<String>,
    pub amount_out: Option<String>,
    pub min_amount_out: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrossChainQuote {
    pub from_token: QuoteTokenInfo,
    pub to_token: QuoteTokenInfo,
    pub from_token_amount: String,
    pub to_token_amount: String,
    /// Upstream spells this field without the second `i`.
    #[serde(rename = "minmumReceive")]
    pub minimum_receive: Option<String>,
    pub router: Option<BridgeRouter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeRouter {
    pub bridge_name: Option<String>,
    pub cross_chain_fee: Option<String>,
    pub other_native_fee: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildTxData {
    /// Unsigned transaction payload; chain specific, passed through verbatim.
    pub tx: Option<serde_json::Value>,
    pub router: Option<BridgeRouter>,
    pub from_token_amount: Option<String>,
    pub to_token_amount: Option<String>,
    #[serde(rename = "minmumReceive")]
    pub minimum_receive: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionHistory {
    pub status: Option<String>,
    pub tx_hash: Option<String>,
    pub from_token_details: Option<serde_json::Value>,
    pub to_token_details: Option<serde_json::Value>,
    pub tx_time: Option<String>,
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeOrder {
    pub ord_id: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressTransactionPage {
    pub transactions: Vec<AddressTransaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressTransaction {
    pub tx_time: Option<String>,
    pub token_contract_address: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeToken {
    pub chain_id: Option<String>,
    pub token_contract_address: Option<String>,
    pub token_symbol: Option<String>,
    pub decimals: Option<String>,
}

/// Parameters of a same-chain swap or swap-instruction call.
#[derive(Debug, Clone)]
pub struct SwapParams {
    pub chain_index: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: String,
    pub user_wallet_address: String,
}

#[derive(Debug, Clone)]
pub struct CrossChainQuoteParams {
    pub from_chain_index: String,
    pub to_chain_index: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: String,
}

#[derive(Debug, Clone)]
pub struct BuildTxParams {
    pub from_chain_index: String,
    pub to_chain_index: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: String,
    pub user_wallet_address: String,
    pub receive_address: String,
}

#[cfg(test)]
mod tests {
    use crate::source::okx::types::{OkxResponse, SameChainQuote};

    #[test]
    fn test_same_chain_quote_deserializes() {
        let raw = r#"{
            "code": "0",
            "msg": "",
            "data": [{
                "fromToken": {"tokenContractAddress": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "tokenSymbol": "USDC", "decimal": "6"},
                "toToken": {"tokenContractAddress": "0xdAC17F958D2ee523a2206206994597C13D831ec7", "tokenSymbol": "USDT", "decimal": "6"},
                "fromTokenAmount": "1500000",
                "toTokenAmount": "1499100",
                "dexRouterList": [{"router": "0x7d0ccaa3fac1e5a943c5168b6ced828691b46b36--Uniswap V3", "routerPercent": "100"}],
                "quoteCompareList": [
                    {"routerName": "Uniswap V3", "amountOut": "1499100", "minAmountOut": "1491600"},
                    {"routerName": "Curve", "amountOut": "1498800", "minAmountOut": "1491300"}
                ]
            }]
        }"#;

        let response: OkxResponse<SameChainQuote> = serde_json::from_str(raw).unwrap();
        assert!(response.is_ok());
        let quote = &response.data[0];
        assert_eq!(quote.from_token.decimal, "6");
        assert_eq!(quote.quote_compare_list.len(), 2);
        assert_eq!(quote.dex_router_list[0].router_percent.as_deref(), Some("100"));
    }

    #[test]
    fn test_error_envelope_deserializes_without_data() {
        let raw = r#"{"code": "51000", "msg": "Parameter chainId error"}"#;
        let response: OkxResponse<SameChainQuote> = serde_json::from_str(raw).unwrap();
        assert!(!response.is_ok());
        assert!(response.data.is_empty());
        assert_eq!(response.msg, "Parameter chainId error");
    }
}
