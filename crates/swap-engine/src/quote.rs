use serde::Serialize;
use thiserror::Error;

use crate::decimals::DEFAULT_DECIMALS;
use crate::source::okx::types::{
    CrossChainQuote, DexRouter, OkxResponse, QuoteTokenInfo, SameChainQuote,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteToken {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Canonical quote shape handed to callers. One upstream response may yield
/// an ordered sequence of these; the first element is the primary route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub from_token: QuoteToken,
    pub to_token: QuoteToken,
    pub amount_in: String,
    pub amount_out: String,
    pub min_amount_out: Option<String>,
    pub router_address: Option<String>,
    pub route_description: Option<String>,
    pub router_name: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum QuoteError {
    /// Upstream error payload: a message with no data.
    #[error("{0}")]
    Upstream(String),

    #[error("No route found for the requested pair")]
    NoRouteFound,
}

/// Reshapes a same-chain aggregator response. When a route-comparison list
/// is present one quote is emitted per compared route, each merging the
/// route-specific output fields over the shared top-level quote fields;
/// otherwise exactly one quote comes from the top level.
pub fn normalize_same_chain(
    response: &OkxResponse<SameChainQuote>,
) -> Result<Vec<Quote>, QuoteError> {
    let main = primary_entry(response)?;

    let router_address = router_contract_address(&main.dex_router_list);
    let from_token = quote_token(&main.from_token);
    let to_token = quote_token(&main.to_token);

    if main.quote_compare_list.is_empty() {
        return Ok(vec![Quote {
            from_token,
            to_token,
            amount_in: main.from_token_amount.clone(),
            amount_out: main.to_token_amount.clone(),
            min_amount_out: None,
            router_address,
            route_description: None,
            router_name: None,
        }]);
    }

    Ok(main
        .quote_compare_list
        .iter()
        .map(|route| Quote {
            from_token: from_token.clone(),
            to_token: to_token.clone(),
            amount_in: main.from_token_amount.clone(),
            amount_out: route
                .amount_out
                .clone()
                .or_else(|| route.min_amount_out.clone())
                .unwrap_or_else(|| main.to_token_amount.clone()),
            min_amount_out: route.min_amount_out.clone(),
            router_address: router_address.clone(),
            route_description: route.path.clone(),
            router_name: route.router_name.clone(),
        })
        .collect())
}

/// Cross-chain routing is single-route upstream; exactly one quote is
/// returned.
pub fn normalize_cross_chain(
    response: &OkxResponse<CrossChainQuote>,
) -> Result<Quote, QuoteError> {
    let quote = primary_entry(response)?;
    let bridge_name = quote.router.as_ref().and_then(|router| router.bridge_name.clone());

    Ok(Quote {
        from_token: quote_token(&quote.from_token),
        to_token: quote_token(&quote.to_token),
        amount_in: quote.from_token_amount.clone(),
        amount_out: quote.to_token_amount.clone(),
        min_amount_out: quote.minimum_receive.clone(),
        router_address: None,
        route_description: bridge_name.clone(),
        router_name: bridge_name,
    })
}

fn primary_entry<T>(response: &OkxResponse<T>) -> Result<&T, QuoteError> {
    match response.data.first() {
        Some(entry) if response.is_ok() => Ok(entry),
        _ if !response.msg.is_empty() => Err(QuoteError::Upstream(response.msg.clone())),
        _ => Err(QuoteError::NoRouteFound),
    }
}

fn quote_token(info: &QuoteTokenInfo) -> QuoteToken {
    QuoteToken {
        address: info.token_contract_address.clone(),
        symbol: info.token_symbol.clone(),
        decimals: info.decimal.parse().unwrap_or(DEFAULT_DECIMALS),
    }
}

/// The contract address is the part of the first router entry's composite
/// string before the `--` delimiter.
fn router_contract_address(routers: &[DexRouter]) -> Option<String> {
    routers
        .first()
        .and_then(|entry| entry.router.split("--").next())
        .filter(|address| !address.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use crate::quote::{normalize_cross_chain, normalize_same_chain, QuoteError};
    use crate::source::okx::types::{CrossChainQuote, OkxResponse, SameChainQuote};

    fn same_chain_response(raw: &str) -> OkxResponse<SameChainQuote> {
        serde_json::from_str(raw).unwrap()
    }

    const THREE_ROUTE_RESPONSE: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [{
            "fromToken": {"tokenContractAddress": "0xfrom", "tokenSymbol": "USDC", "decimal": "6"},
            "toToken": {"tokenContractAddress": "0xto", "tokenSymbol": "WETH", "decimal": "18"},
            "fromTokenAmount": "1500000",
            "toTokenAmount": "420000000000000",
            "dexRouterList": [{"router": "0x7d0ccaa3fac1e5a943c5168b6ced828691b46b36--Uniswap V3--WETH"}],
            "quoteCompareList": [
                {"routerName": "Uniswap V3", "amountOut": "420000000000000", "minAmountOut": "417900000000000"},
                {"routerName": "Curve", "amountOut": "419000000000000", "minAmountOut": "416900000000000"},
                {"routerName": "Balancer", "minAmountOut": "415000000000000"}
            ]
        }]
    }"#;

    #[test]
    fn test_one_quote_per_compared_route() {
        let quotes = normalize_same_chain(&same_chain_response(THREE_ROUTE_RESPONSE)).unwrap();

        assert_eq!(quotes.len(), 3);
        for quote in &quotes {
            assert_eq!(quote.from_token.address, "0xfrom");
            assert_eq!(quote.amount_in, "1500000");
            assert_eq!(
                quote.router_address.as_deref(),
                Some("0x7d0ccaa3fac1e5a943c5168b6ced828691b46b36")
            );
        }
        assert_eq!(quotes[0].amount_out, "420000000000000");
        assert_eq!(quotes[0].min_amount_out.as_deref(), Some("417900000000000"));
        assert_eq!(quotes[1].amount_out, "419000000000000");
        assert_eq!(quotes[1].router_name.as_deref(), Some("Curve"));
        // Route without its own amountOut falls back to minAmountOut
        assert_eq!(quotes[2].amount_out, "415000000000000");
    }

    #[test]
    fn test_single_quote_without_comparison_list() {
        let raw = r#"{
            "code": "0",
            "msg": "",
            "data": [{
                "fromToken": {"tokenContractAddress": "0xfrom", "tokenSymbol": "USDC", "decimal": "6"},
                "toToken": {"tokenContractAddress": "0xto", "tokenSymbol": "USDT", "decimal": "6"},
                "fromTokenAmount": "1",
                "toTokenAmount": "1",
                "dexRouterList": []
            }]
        }"#;

        let quotes = normalize_same_chain(&same_chain_response(raw)).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].amount_out, "1");
        assert_eq!(quotes[0].min_amount_out, None);
        assert_eq!(quotes[0].router_address, None);
    }

    #[test]
    fn test_upstream_message_surfaces_as_error() {
        let raw = r#"{"code": "51000", "msg": "Parameter chainId error", "data": []}"#;
        assert_eq!(
            normalize_same_chain(&same_chain_response(raw)).unwrap_err(),
            QuoteError::Upstream("Parameter chainId error".to_string())
        );
    }

    #[test]
    fn test_empty_data_without_message_is_no_route() {
        let raw = r#"{"code": "0", "msg": "", "data": []}"#;
        assert_eq!(
            normalize_same_chain(&same_chain_response(raw)).unwrap_err(),
            QuoteError::NoRouteFound
        );
    }

    #[test]
    fn test_cross_chain_single_route() {
        let raw = r#"{
            "code": "0",
            "msg": "",
            "data": [{
                "fromToken": {"tokenContractAddress": "0xfrom", "tokenSymbol": "USDC", "decimal": "6"},
                "toToken": {"tokenContractAddress": "0xto", "tokenSymbol": "USDC", "decimal": "6"},
                "fromTokenAmount": "25000000",
                "toTokenAmount": "24800000",
                "minmumReceive": "24700000",
                "router": {"bridgeName": "Stargate", "crossChainFee": "0.2"}
            }]
        }"#;

        let response: OkxResponse<CrossChainQuote> = serde_json::from_str(raw).unwrap();
        let quote = normalize_cross_chain(&response).unwrap();

        assert_eq!(quote.amount_in, "25000000");
        assert_eq!(quote.amount_out, "24800000");
        assert_eq!(quote.min_amount_out.as_deref(), Some("24700000"));
        assert_eq!(quote.router_name.as_deref(), Some("Stargate"));
    }

    #[test]
    fn test_cross_chain_error_payload() {
        let raw = r#"{"code": "82000", "msg": "Insufficient liquidity", "data": []}"#;
        let response: OkxResponse<CrossChainQuote> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            normalize_cross_chain(&response).unwrap_err(),
            QuoteError::Upstream("Insufficient liquidity".to_string())
        );
    }
}
