use std::collections::HashSet;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::ErrorKind;
use crate::source::okx::types::AddressTransaction;
use crate::source::okx::{OkxClientError, OkxDexClient};
use crate::throttle::RateLimitedCache;

const SCORE_FLOOR: f64 = 300.0;
const SCORE_CEILING: f64 = 900.0;

const FACTOR_CHAINS: &str = "1";
const FACTOR_TX_LIMIT: u32 = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditFactors {
    pub wallet_age_days: u32,
    pub tx_frequency: u32,
    pub token_diversity: u32,
    pub protocol_interactions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScore {
    pub score: u32,
    pub factors: CreditFactors,
    pub explanation: String,
}

#[derive(Debug, Error)]
pub enum CreditScoreError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Client(#[from] OkxClientError),

    #[error("Aggregator error: code {0}, msg {1}")]
    Upstream(String, String),
}

impl CreditScoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CreditScoreError::Validation(_) => ErrorKind::Validation,
            CreditScoreError::Client(OkxClientError::SignatureError(_)) => ErrorKind::Internal,
            CreditScoreError::Client(_) | CreditScoreError::Upstream(_, _) => ErrorKind::Upstream,
        }
    }
}

/// Scores a wallet from its recent aggregator transaction history. The
/// delegated AI scorer is primary; the local rules-based formula is the
/// fallback when that call fails. Results are memoized per address behind
/// the shared upstream rate limit.
#[derive(Debug)]
pub struct CreditScorer {
    client: OkxDexClient,
    http: reqwest::Client,
    scorer_base_url: String,
    cache: RateLimitedCache<CreditScore>,
}

impl CreditScorer {
    pub fn new(
        client: OkxDexClient,
        scorer_base_url: String,
        cache: RateLimitedCache<CreditScore>,
    ) -> Self {
        CreditScorer {
            client,
            http: reqwest::Client::new(),
            scorer_base_url: scorer_base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    pub async fn score(&self, address: &str) -> Result<CreditScore, CreditScoreError> {
        if address.trim().is_empty() {
            return Err(CreditScoreError::Validation("Missing address".to_string()));
        }

        self.cache
            .get_or_try_insert_with(address, async {
                let response = self
                    .client
                    .transactions_by_address(address, FACTOR_CHAINS, FACTOR_TX_LIMIT)
                    .await?;
                if !response.is_ok() {
                    return Err(CreditScoreError::Upstream(response.code, response.msg));
                }

                let transactions = response
                    .data
                    .into_iter()
                    .next()
                    .map(|page| page.transactions)
                    .unwrap_or_default();
                debug!("Scoring {} from {} transactions", address, transactions.len());

                let factors = extract_factors(&transactions);
                Ok(self.delegated_or_local(factors).await)
            })
            .await
    }

    async fn delegated_or_local(&self, factors: CreditFactors) -> CreditScore {
        match self.delegated_score(&factors).await {
            Ok(score) => score,
            Err(err) => {
                warn!("Delegated credit scoring failed, using local fallback: {}", err);
                CreditScore {
                    score: rules_based_score(&factors),
                    factors,
                    explanation: "Fallback: Local rules-based score.".to_string(),
                }
            }
        }
    }

    async fn delegated_score(
        &self,
        factors: &CreditFactors,
    ) -> Result<CreditScore, reqwest::Error> {
        let response = self
            .http
            .post(format!("{}/ai/credit-score", self.scorer_base_url))
            .json(&serde_json::json!({ "factors": factors }))
            .send()
            .await?
            .error_for_status()?;

        let scored: DelegatedScore = response.json().await?;
        Ok(CreditScore {
            score: scored.score,
            factors: factors.clone(),
            explanation: scored.explanation.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DelegatedScore {
    score: u32,
    #[serde(default)]
    explanation: Option<String>,
}

/// Reference fallback formula, 300 to 900. Heuristic, not a stable
/// contract.
pub fn rules_based_score(factors: &CreditFactors) -> u32 {
    let mut score = SCORE_FLOOR;
    score += f64::from(factors.wallet_age_days.min(365)) * 0.55;
    score += f64::from(factors.tx_frequency.min(500)) * 0.4;
    score += f64::from(factors.token_diversity.min(20)) * 5.0;
    score += f64::from(factors.protocol_interactions.min(20)) * 5.0;
    score.min(SCORE_CEILING).round() as u32
}

pub fn extract_factors(transactions: &[AddressTransaction]) -> CreditFactors {
    if transactions.is_empty() {
        return CreditFactors::default();
    }

    let now_ms = Utc::now().timestamp_millis();
    let oldest = transactions
        .iter()
        .filter_map(|tx| tx.tx_time.as_deref().and_then(|time| time.parse::<i64>().ok()))
        .min();
    let wallet_age_days = oldest
        .map(|oldest| ((now_ms - oldest) / (1000 * 60 * 60 * 24)).max(0) as u32)
        .unwrap_or(0);

    let token_diversity = transactions
        .iter()
        .filter_map(|tx| tx.token_contract_address.as_deref().or(tx.symbol.as_deref()))
        .collect::<HashSet<_>>()
        .len() as u32;
    let protocol_interactions = transactions
        .iter()
        .filter_map(|tx| tx.symbol.as_deref())
        .collect::<HashSet<_>>()
        .len() as u32;

    CreditFactors {
        wallet_age_days,
        tx_frequency: transactions.len() as u32,
        token_diversity,
        protocol_interactions,
    }
}
