//! Ethereum wallet gateway.
//!
//! Mediates between end-user wallet clients and an Ethereum JSON-RPC
//! node: account balance inspection, unsigned transaction skeletons,
//! signed transaction broadcast, and address registration for push
//! notifications. Tracks pending transactions in Postgres so that
//! balance queries and nonce assignment reflect in-flight work the
//! chain node doesn't expose yet.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gateway_api::{AnonymousVerifier, AppState};
use gateway_chain::AlloyProvider;
use gateway_core::{GatewayConfig, LegacyRlpCodec, PgLedger, RedisNonceCache};

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gateway_core=debug,gateway_chain=debug")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    config.log_config();

    info!("Starting Ethereum wallet gateway");

    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    info!("Database pool connected and migrations applied");

    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    info!("Redis connection manager ready");

    let state = Arc::new(AppState {
        chain: Arc::new(AlloyProvider::new(config.chain_rpc_url.clone())),
        ledger: Arc::new(PgLedger::new(db_pool)),
        cache: Arc::new(RedisNonceCache::new(redis_conn)),
        codec: Arc::new(LegacyRlpCodec::new(config.chain_id)),
        verifier: Arc::new(AnonymousVerifier),
        config: config.clone(),
    });

    let app = gateway_api::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╦ ╦┌─┐┬  ┬  ┌─┐┌┬┐  ╔═╗┌─┐┌┬┐┌─┐┬ ┬┌─┐┬ ┬
    ║║║├─┤│  │  ├┤  │   ║ ╦├─┤ │ ├┤ │││├─┤└┬┘
    ╚╩╝┴ ┴┴─┘┴─┘└─┘ ┴   ╚═╝┴ ┴ ┴ └─┘└┴┘┴ ┴ ┴
    "#
    );
}
