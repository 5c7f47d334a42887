//! Environment configuration for the order service and its gateway.

use anyhow::{anyhow, Context};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::CircuitBreakerConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { url: String, max_connections: u32 },
    /// Process-local store; orders vanish on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// gRPC listen address
    pub listen_addr: SocketAddr,
    pub user_service_url: String,
    pub product_service_url: String,
    pub store: StoreBackend,
    /// Ceiling on every request deadline
    pub request_timeout: Duration,
    pub metrics_port: u16,
    pub circuit_breaker: CircuitBreakerConfig,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub order_service_url: String,
    /// Forwarded to the order service as the gRPC deadline
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("ORDER_STORE").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                url: database_url(&lookup),
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(anyhow!("ORDER_STORE must be 'postgres' or 'memory', got {other:?}")),
        };

        let defaults = CircuitBreakerConfig::default();
        let circuit_breaker = CircuitBreakerConfig {
            failure_threshold: parse_or(&lookup, "CIRCUIT_FAILURE_THRESHOLD", defaults.failure_threshold)?,
            open_interval: Duration::from_secs(parse_or(&lookup, "CIRCUIT_OPEN_SECS", 30)?),
            ..defaults
        };

        Ok(Self {
            listen_addr: parse_or(&lookup, "ORDER_SERVICE_ADDR", SocketAddr::from(([0, 0, 0, 0], 50053)))?,
            user_service_url: endpoint_url(lookup("USER_SERVICE_ADDR").as_deref().unwrap_or("127.0.0.1:50051")),
            product_service_url: endpoint_url(lookup("PRODUCT_SERVICE_ADDR").as_deref().unwrap_or("127.0.0.1:50052")),
            store,
            request_timeout: Duration::from_millis(parse_or(&lookup, "REQUEST_TIMEOUT_MS", 5000)?),
            metrics_port: parse_or(&lookup, "METRICS_PORT", 9090)?,
            circuit_breaker,
        })
    }
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            listen_addr: parse_or(&lookup, "GATEWAY_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            order_service_url: endpoint_url(lookup("ORDER_SERVICE_URL").as_deref().unwrap_or("127.0.0.1:50053")),
            timeout: Duration::from_millis(parse_or(&lookup, "GATEWAY_TIMEOUT_MS", 5000)?),
        })
    }
}

/// Prefix `http://` onto bare `host:port` endpoints.
pub fn endpoint_url(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

fn database_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
        return url;
    }
    let part = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
    format!(
        "postgres://{}:{}@{}:{}/{}",
        part("DB_USER", "postgres"),
        part("DB_PASSWORD", "postgres"),
        part("DB_HOST", "localhost"),
        part("DB_PORT", "5432"),
        part("DB_NAME", "orders"),
    )
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid {name}: {value:?}")),
        None => Ok(default),
    }
}
