use std::sync::Arc;

use axum::{
    extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde_json::json;

use config::TokenSyncConfig;
use storage::{MongoDBClient, TokenRegistry};
use swap_engine::credit::{CreditScoreError, CreditScorer};
use swap_engine::engine::{ErrorKind, QuoteRequest, SwapEngine, SwapEngineError, SwapIntent};
use swap_engine::token_sync::TokenIndexer;
use swap_engine::OkxDexClient;

use crate::types::{
    ApprovePayload, CreditScoreQuery, OrderStatusQuery, TokensQuery, TransactionStatusQuery,
};

pub struct ServiceController {
    engine: Arc<SwapEngine<MongoDBClient>>,
    scorer: Arc<CreditScorer>,
    registry: Arc<MongoDBClient>,
    okx_client: OkxDexClient,
    token_sync: TokenSyncConfig,
}

impl ServiceController {
    pub fn new(
        engine: Arc<SwapEngine<MongoDBClient>>,
        scorer: Arc<CreditScorer>,
        registry: Arc<MongoDBClient>,
        okx_client: OkxDexClient,
        token_sync: TokenSyncConfig,
    ) -> Self {
        Self { engine, scorer, registry, okx_client, token_sync }
    }

    pub fn router(self) -> Router {
        let engine = self.engine.clone();
        let scorer = self.scorer.clone();
        let registry = self.registry.clone();
        let okx_client = self.okx_client.clone();
        let token_sync = Arc::new(self.token_sync);

        Router::new()
            .route("/", get(ServiceController::status))
            .route("/api/health", get(ServiceController::status))
            .route(
                "/api/quotes",
                axum::routing::post({
                    let engine = engine.clone();
                    move |Json(payload): Json<QuoteRequest>| async move {
                        ServiceController::same_chain_quotes(engine.clone(), payload).await
                    }
                }),
            )
            .route(
                "/api/quotes/swap",
                axum::routing::post({
                    let engine = engine.clone();
                    move |Json(payload): Json<SwapIntent>| async move {
                        ServiceController::build_swap(engine.clone(), payload).await
                    }
                }),
            )
            .route(
                "/api/quotes/approve",
                axum::routing::post({
                    let engine = engine.clone();
                    move |Json(payload): Json<ApprovePayload>| async move {
                        ServiceController::approve(engine.clone(), payload).await
                    }
                }),
            )
            .route(
                "/api/quotes/transaction-status",
                get({
                    let engine = engine.clone();
                    move |Query(query): Query<TransactionStatusQuery>| async move {
                        ServiceController::transaction_status(engine.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/crosschain/quote",
                axum::routing::post({
                    let engine = engine.clone();
                    move |Json(payload): Json<QuoteRequest>| async move {
                        ServiceController::cross_chain_quote(engine.clone(), payload).await
                    }
                }),
            )
            .route(
                "/api/crosschain/swap",
                axum::routing::post({
                    let engine = engine.clone();
                    move |Json(payload): Json<SwapIntent>| async move {
                        ServiceController::build_bridge(engine.clone(), payload).await
                    }
                }),
            )
            .route(
                "/api/crosschain/tx-status",
                get({
                    let engine = engine.clone();
                    move |Query(query): Query<OrderStatusQuery>| async move {
                        ServiceController::bridge_tx_status(engine.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/credit-score",
                get({
                    let scorer = scorer.clone();
                    move |Query(query): Query<CreditScoreQuery>| async move {
                        ServiceController::credit_score(scorer.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/tokens",
                get({
                    let registry = registry.clone();
                    move |Query(query): Query<TokensQuery>| async move {
                        ServiceController::tokens(registry.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/tokens/chains",
                get({
                    let registry = registry.clone();
                    move || async move { ServiceController::chains(registry.clone()).await }
                }),
            )
            .route(
                "/api/tokens/fetch",
                axum::routing::post({
                    let registry = registry.clone();
                    move || async move {
                        ServiceController::fetch_tokens(okx_client, token_sync, registry.clone())
                            .await
                    }
                }),
            )
    }

    /// Health check endpoint
    pub async fn status() -> impl IntoResponse {
        let response = json!({
            "message": "Service is running...",
            "status": "ok"
        });
        (StatusCode::OK, Json(response))
    }

    /// Same-chain quotes, best route first
    pub async fn same_chain_quotes(
        engine: Arc<SwapEngine<MongoDBClient>>,
        payload: QuoteRequest,
    ) -> impl IntoResponse {
        match engine.same_chain_quotes(&payload).await {
            Ok(quotes) => (StatusCode::OK, Json(json!({ "quotes": quotes }))),
            Err(err) => engine_error(err),
        }
    }

    /// Unsigned same-chain swap transaction
    pub async fn build_swap(
        engine: Arc<SwapEngine<MongoDBClient>>,
        payload: SwapIntent,
    ) -> impl IntoResponse {
        match engine.build_swap(&payload).await {
            Ok(swap_data) => (StatusCode::OK, Json(json!({ "swapData": swap_data }))),
            Err(err) => engine_error(err),
        }
    }

    /// Token approval transaction data, passed through unchanged
    pub async fn approve(
        engine: Arc<SwapEngine<MongoDBClient>>,
        payload: ApprovePayload,
    ) -> impl IntoResponse {
        match engine
            .approval_transaction(
                &payload.chain_index,
                &payload.token_contract_address,
                &payload.approve_amount,
            )
            .await
        {
            Ok(approve_data) => (StatusCode::OK, Json(json!({ "approveData": approve_data }))),
            Err(err) => engine_error(err),
        }
    }

    /// Same-chain transaction history record
    pub async fn transaction_status(
        engine: Arc<SwapEngine<MongoDBClient>>,
        query: TransactionStatusQuery,
    ) -> impl IntoResponse {
        match engine.transaction_history(&query.chain_index, &query.tx_hash).await {
            Ok(history) => (StatusCode::OK, Json(json!(history))),
            Err(err) => engine_error(err),
        }
    }

    /// Cross-chain quote (single route by upstream design)
    pub async fn cross_chain_quote(
        engine: Arc<SwapEngine<MongoDBClient>>,
        payload: QuoteRequest,
    ) -> impl IntoResponse {
        match engine.cross_chain_quote(&payload).await {
            Ok(quote) => (StatusCode::OK, Json(json!({ "quote": quote }))),
            Err(err) => engine_error(err),
        }
    }

    /// Unsigned bridge transaction via build-tx
    pub async fn build_bridge(
        engine: Arc<SwapEngine<MongoDBClient>>,
        payload: SwapIntent,
    ) -> impl IntoResponse {
        match engine.build_bridge(&payload).await {
            Ok(build) => (StatusCode::OK, Json(json!(build))),
            Err(err) => engine_error(err),
        }
    }

    /// Canonical status of a bridge order
    pub async fn bridge_tx_status(
        engine: Arc<SwapEngine<MongoDBClient>>,
        query: OrderStatusQuery,
    ) -> impl IntoResponse {
        match engine.bridge_order_status(&query.tx_hash).await {
            Ok(status) => (StatusCode::OK, Json(json!({ "status": status }))),
            Err(err) => engine_error(err),
        }
    }

    /// Cached, rate-limited wallet credit score
    pub async fn credit_score(
        scorer: Arc<CreditScorer>,
        query: CreditScoreQuery,
    ) -> impl IntoResponse {
        match scorer.score(&query.address).await {
            Ok(score) => (StatusCode::OK, Json(json!(score))),
            Err(err) => scorer_error(err),
        }
    }

    /// Registry tokens, optionally filtered by chain
    pub async fn tokens(registry: Arc<MongoDBClient>, query: TokensQuery) -> impl IntoResponse {
        match registry.tokens(query.chain.as_deref()).await {
            Ok(tokens) => (StatusCode::OK, Json(json!(tokens))),
            Err(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": err.to_string() })))
            }
        }
    }

    /// Distinct chains present in the registry
    pub async fn chains(registry: Arc<MongoDBClient>) -> impl IntoResponse {
        match registry.chains().await {
            Ok(chains) => (StatusCode::OK, Json(json!(chains))),
            Err(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": err.to_string() })))
            }
        }
    }

    /// Manual trigger for the token list sync
    pub async fn fetch_tokens(
        okx_client: OkxDexClient,
        token_sync: Arc<TokenSyncConfig>,
        registry: Arc<MongoDBClient>,
    ) -> impl IntoResponse {
        let indexer = TokenIndexer::new(token_sync.as_ref(), &okx_client, registry.as_ref());
        match indexer.run().await {
            Ok(upserted) => (
                StatusCode::OK,
                Json(json!({
                    "message": "Tokens fetched and stored in the registry.",
                    "upserted": upserted
                })),
            ),
            Err(err) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": err.to_string() }))),
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn engine_error(err: SwapEngineError) -> (StatusCode, Json<serde_json::Value>) {
    (status_for(err.kind()), Json(json!({ "error": err.to_string() })))
}

fn scorer_error(err: CreditScoreError) -> (StatusCode, Json<serde_json::Value>) {
    (status_for(err.kind()), Json(json!({ "error": err.to_string() })))
}
