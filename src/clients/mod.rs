// ============================================================================
// Collaborator Clients
// ============================================================================
//
// The orchestrator consumes two remote services through narrow traits:
// - UserDirectory: does this user exist?
// - ProductCatalog: does this product exist, at what price, with what stock?
//
// Absence is a normal answer (`false` / `None`), never an error. Errors are
// reserved for calls that could not produce an answer.
//
// ============================================================================

mod grpc;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use rust_decimal::Decimal;

pub use grpc::{GrpcProductCatalog, GrpcUserDirectory};

pub const USER_SERVICE: &str = "user-service";
pub const PRODUCT_SERVICE: &str = "product-service";

/// Catalog facts about a product at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub unit_price: Decimal,
    pub stock: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    #[error("circuit breaker open for {0}")]
    CircuitOpen(&'static str),

    #[error("{service} returned malformed data: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: &str) -> Result<bool, CollaboratorError>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, CollaboratorError>;
}
