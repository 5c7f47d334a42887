use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use super::aggregate::{NewOrder, Order, OrderPage};
use super::commands::{CreateOrder, LineRequest, Page};
use super::errors::OrderError;
use super::value_objects::{round_money, OrderItem, MAX_MONEY};
use crate::clients::{ProductCatalog, UserDirectory};
use crate::store::{OrderStore, StoreError};

// ============================================================================
// Order Orchestrator
// ============================================================================
//
// CreateOrder: shape check → user exists → products (fan-out) → total →
// atomic commit. Reads: GetOrder, GetUserOrders.
//
// Every remote step is bounded by the caller's deadline, and so is getting
// a store transaction. Once the transaction has begun the commit runs on its
// own task and finishes even if the caller goes away.
//
// Stock is read, not reserved. Two concurrent orders for the same product
// can both pass the stock check.
//
// ============================================================================

pub struct OrderOrchestrator {
    users: Arc<dyn UserDirectory>,
    products: Arc<dyn ProductCatalog>,
    store: Arc<dyn OrderStore>,
}

async fn before_deadline<T, F>(deadline: Instant, step: &'static str, future: F) -> Result<T, OrderError>
where
    F: Future<Output = T>,
{
    timeout_at(deadline, future)
        .await
        .map_err(|_| OrderError::DeadlineExceeded(step))
}

impl OrderOrchestrator {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        products: Arc<dyn ProductCatalog>,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        Self { users, products, store }
    }

    pub async fn create_order(&self, command: CreateOrder, deadline: Instant) -> Result<Order, OrderError> {
        command.validate()?;

        tracing::info!(
            user_id = %command.user_id,
            lines = command.items.len(),
            "Creating order"
        );

        self.ensure_user_exists(&command.user_id, deadline).await?;

        let items = before_deadline(deadline, "checking products", self.snapshot_items(&command.items)).await??;
        let new_order = NewOrder::pending(command.user_id, items)?;

        if Instant::now() >= deadline {
            return Err(OrderError::DeadlineExceeded("committing order"));
        }

        // The store gives up if it cannot begin by the deadline; past that
        // point the commit finishes even if this future is dropped.
        let store = Arc::clone(&self.store);
        let order = tokio::spawn(async move { store.create_order(new_order, deadline).await })
            .await
            .map_err(|e| OrderError::Internal(format!("commit task failed: {e}")))?
            .map_err(|e| match e {
                StoreError::DeadlineExceeded => OrderError::DeadlineExceeded("starting commit"),
                other => OrderError::Store(other),
            })?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total,
            "✅ Order created"
        );

        Ok(order)
    }

    pub async fn get_order(&self, id: &str, deadline: Instant) -> Result<Order, OrderError> {
        if id.trim().is_empty() {
            return Err(OrderError::InvalidArgument("order id is required".to_string()));
        }
        // A malformed id names no order.
        let order_id = Uuid::parse_str(id.trim()).map_err(|_| OrderError::OrderNotFound(id.to_string()))?;

        match before_deadline(deadline, "loading order", self.store.get_order_by_id(order_id)).await? {
            Ok(order) => Ok(order),
            Err(StoreError::NotFound) => Err(OrderError::OrderNotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user_orders(&self, user_id: &str, page: Page, deadline: Instant) -> Result<OrderPage, OrderError> {
        if user_id.trim().is_empty() {
            return Err(OrderError::InvalidArgument("user id is required".to_string()));
        }

        self.ensure_user_exists(user_id, deadline).await?;

        let result = before_deadline(deadline, "listing orders", self.store.list_orders_by_user(user_id, page)).await??;

        tracing::debug!(
            user_id = %user_id,
            returned = result.orders.len(),
            total = result.total,
            limit = page.limit,
            offset = page.offset,
            "Listed user orders"
        );

        Ok(result)
    }

    async fn ensure_user_exists(&self, user_id: &str, deadline: Instant) -> Result<(), OrderError> {
        let exists = before_deadline(deadline, "checking user", self.users.user_exists(user_id))
            .await?
            .map_err(|source| OrderError::Collaborator {
                context: "user lookup failed",
                source,
            })?;

        if exists {
            Ok(())
        } else {
            Err(OrderError::UserNotFound(user_id.to_string()))
        }
    }

    /// Look up every line's product concurrently, then check them in request
    /// order so the reported failure is deterministic.
    async fn snapshot_items(&self, lines: &[LineRequest]) -> Result<Vec<OrderItem>, OrderError> {
        let lookups = lines.iter().map(|line| self.products.get_product(&line.product_id));
        let results = join_all(lookups).await;

        lines
            .iter()
            .zip(results)
            .map(|(line, result)| {
                let product = result
                    .map_err(|source| OrderError::Collaborator {
                        context: "product lookup failed",
                        source,
                    })?
                    .ok_or_else(|| OrderError::ProductNotFound(line.product_id.clone()))?;

                if product.unit_price <= Decimal::ZERO || product.unit_price > MAX_MONEY {
                    return Err(OrderError::Internal(format!(
                        "catalog returned out-of-range price {} for product {}",
                        product.unit_price, line.product_id
                    )));
                }

                if product.stock < i64::from(line.quantity) {
                    tracing::info!(
                        product_id = %line.product_id,
                        requested = line.quantity,
                        available = product.stock,
                        "Insufficient stock"
                    );
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id.clone(),
                        requested: line.quantity,
                        available: product.stock,
                    });
                }

                Ok(OrderItem {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price: round_money(product.unit_price),
                })
            })
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
