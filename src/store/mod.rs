// ============================================================================
// Order Store
// ============================================================================
//
// Durable home of orders and their items. Every implementation must:
// 1. Write an order and all its items as one atomic unit
// 2. Stamp `created_at` at insert time
// 3. List a user's orders newest first with a count that ignores paging
//
// ============================================================================

mod memory;
mod postgres;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::order::{NewOrder, Order, OrderPage, Page};

pub use memory::InMemoryOrderStore;
pub use postgres::{PgOrderStore, SCHEMA};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found")]
    NotFound,

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("deadline passed before the write began")]
    DeadlineExceeded,

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
                return StoreError::Constraint(db.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order row and every item row, or nothing at all.
    /// `deadline` bounds getting a transaction; once begun, the write runs to
    /// commit or rollback regardless of it.
    async fn create_order(&self, order: NewOrder, deadline: Instant) -> Result<Order, StoreError>;

    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, StoreError>;

    async fn list_orders_by_user(&self, user_id: &str, page: Page) -> Result<OrderPage, StoreError>;
}
