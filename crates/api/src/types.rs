use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayload {
    pub chain_index: String,
    pub token_contract_address: String,
    pub approve_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusQuery {
    pub chain_index: String,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusQuery {
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct CreditScoreQuery {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct TokensQuery {
    pub chain: Option<String>,
}
