use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tonic::transport::Server;

use order_service::clients::{GrpcProductCatalog, GrpcUserDirectory};
use order_service::config::{Config, StoreBackend};
use order_service::domain::order::OrderOrchestrator;
use order_service::metrics::{self, Metrics};
use order_service::proto::{self, order::order_service_server::OrderServiceServer};
use order_service::store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use order_service::telemetry;
use order_service::transport::OrderGrpcService;
use order_service::utils::{retry_with_backoff, RetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Default to INFO, overridable with RUST_LOG
    telemetry::init_tracing("info,order_service=debug");

    tracing::info!("🚀 Starting order service");
    let config = Config::from_env()?;

    // === 1. Order store ===
    let store: Arc<dyn OrderStore> = match &config.store {
        StoreBackend::Postgres { url, max_connections } => {
            tracing::info!(max_connections, "Connecting to PostgreSQL...");
            let pool = retry_with_backoff("postgres connect", &RetryConfig::default(), |_| {
                PgPoolOptions::new().max_connections(*max_connections).connect(url)
            })
            .await?;

            let store = PgOrderStore::new(pool);
            store.apply_schema().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store; orders are lost on restart");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    // === 2. Collaborators (circuit-broken, connected on first use) ===
    let users = Arc::new(GrpcUserDirectory::connect_lazy(
        &config.user_service_url,
        config.circuit_breaker.clone(),
    )?);
    let products = Arc::new(GrpcProductCatalog::connect_lazy(
        &config.product_service_url,
        config.circuit_breaker.clone(),
    )?);
    tracing::info!(
        user_service = %config.user_service_url,
        product_service = %config.product_service_url,
        "Collaborator clients ready"
    );

    // === 3. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let system = actix_web::rt::System::new();
        if let Err(e) = system.block_on(metrics::start_metrics_server(metrics_registry, metrics_port)) {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    // === 4. gRPC server ===
    let orchestrator = Arc::new(OrderOrchestrator::new(users, products, store));
    let service = OrderGrpcService::new(orchestrator, metrics, config.request_timeout);

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<OrderServiceServer<OrderGrpcService>>()
        .await;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build_v1()?;

    tracing::info!(
        addr = %config.listen_addr,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "✅ Order service listening"
    );

    Server::builder()
        .add_service(health_service)
        .add_service(reflection)
        .add_service(OrderServiceServer::new(service))
        .serve_with_shutdown(config.listen_addr, shutdown_signal())
        .await?;

    tracing::info!("Order service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
