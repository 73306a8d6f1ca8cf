use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use clap::Parser;
use log::{debug, error, info};
use tower_http::cors::{Any, CorsLayer};

use api::service_controller::ServiceController;
use config::Config;
use storage::MongoDBClient;
use swap_engine::auth::Credentials;
use swap_engine::credit::CreditScorer;
use swap_engine::engine::SwapEngine;
use swap_engine::throttle::RateLimitedCache;
use swap_engine::token_sync::TokenIndexer;
use swap_engine::OkxDexClient;

const REGISTRY_DB: &str = "profitpath";
const REGISTRY_COLLECTION: &str = "tokens";

#[derive(Parser, Debug)]
struct Args {
    /// Run the API server (default)
    #[arg(short, long)]
    server: bool,

    /// Fetch the aggregator token lists into the registry, then exit
    #[arg(short = 't', long)]
    sync_tokens: bool,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let mut args = Args::parse();
    debug!("Args: {:?}", args);

    if args.server && args.sync_tokens {
        panic!("Cannot run both the server and the token sync at the same time");
    }

    if !args.server && !args.sync_tokens {
        args.server = true;
        debug!("Running server by default");
    }

    // Load configuration from yaml
    let config = Config::from_file(&args.config).expect("Failed to load config file");

    // All three credential variables are mandatory; fail before serving anything
    let credentials = Credentials::from_env().expect("Aggregator API credentials not configured");

    if args.sync_tokens {
        run_token_sync(config, credentials).await;
    } else {
        run_server(config, credentials).await;
    }
}

async fn run_server(config: Config, credentials: Credentials) {
    info!("Starting ProfitPath server");

    let (app_host, app_port) = (config.server.host.clone(), config.server.port);

    let registry = Arc::new(
        MongoDBClient::new(
            &config.infra.mongo_url,
            REGISTRY_DB.to_string(),
            REGISTRY_COLLECTION.to_string(),
            true,
        )
        .await
        .expect("Failed to create MongoDB token registry"),
    );

    let okx_client =
        OkxDexClient::new(&config.okx, credentials).expect("Failed to instantiate OKX DEX client");

    let engine = Arc::new(SwapEngine::new(okx_client.clone(), registry.clone()));

    let score_cache = RateLimitedCache::new(
        Duration::from_millis(config.cache.min_interval_ms),
        Duration::from_secs(config.cache.ttl_sec),
    );
    let scorer = Arc::new(CreditScorer::new(
        okx_client.clone(),
        config.scorer.base_url.clone(),
        score_cache,
    ));

    // API service controller
    let service_controller =
        ServiceController::new(engine, scorer, registry, okx_client, config.token_sync);

    let cors =
        CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::POST]);

    let app = service_controller.router().layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", app_host, app_port))
        .await
        .expect("Failed to bind port");

    axum::serve(listener, app.into_make_service()).await.unwrap();

    info!("Server stopped.");
}

async fn run_token_sync(config: Config, credentials: Credentials) {
    info!("Configuring token sync");

    let registry = MongoDBClient::new(
        &config.infra.mongo_url,
        REGISTRY_DB.to_string(),
        REGISTRY_COLLECTION.to_string(),
        true,
    )
    .await
    .expect("Failed to create MongoDB token registry");

    let okx_client =
        OkxDexClient::new(&config.okx, credentials).expect("Failed to instantiate OKX DEX client");

    let indexer = TokenIndexer::new(&config.token_sync, &okx_client, &registry);

    match indexer.run().await {
        Ok(upserted) => info!("Token sync completed, {} tokens upserted", upserted),
        Err(e) => error!("Token sync failed: {}", e),
    };
}
