use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use order_service::config::GatewayConfig;
use order_service::gateway::{self, GrpcOrderApi, OrderApi};
use order_service::telemetry;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    telemetry::init_tracing("info,order_service=debug,gateway=debug");

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        listen = %config.listen_addr,
        order_service = %config.order_service_url,
        timeout_ms = config.timeout.as_millis() as u64,
        "🚀 Starting API gateway"
    );

    let api: Arc<dyn OrderApi> = Arc::new(GrpcOrderApi::connect_lazy(&config.order_service_url, config.timeout)?);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(api.clone()))
            .configure(gateway::configure)
    })
    .bind(config.listen_addr)?
    .run()
    .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}
