//! Cinebill service binary.
//!
//! Loads configuration, wires the PostgreSQL stores and the Stripe gateway
//! into the billing router, and serves HTTP.

use std::sync::Arc;

use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinebill::adapters::http::billing::{billing_router, BillingAppState};
use cinebill::adapters::postgres::{
    PostgresFundingStore, PostgresPaymentStore, PostgresSubscriptionStore, PostgresUserStore,
};
use cinebill::adapters::stripe::{StripeGateway, StripeGatewayConfig};
use cinebill::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.server.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !config.payment.is_configured() {
        tracing::warn!("Stripe credentials absent - billing is disabled for this instance");
    }

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let state = BillingAppState {
        subscriptions: Arc::new(PostgresSubscriptionStore::new(pool.clone())),
        payments: Arc::new(PostgresPaymentStore::new(pool.clone())),
        fundings: Arc::new(PostgresFundingStore::new(pool.clone())),
        users: Arc::new(PostgresUserStore::new(pool)),
        gateway: Arc::new(StripeGateway::new(StripeGatewayConfig::from_payment_config(
            &config.payment,
        ))),
    };

    let app = Router::new()
        .nest("/api", billing_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Starting cinebill billing service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
