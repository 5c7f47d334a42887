use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use super::{OrderStore, StoreError};
use crate::domain::order::{NewOrder, Order, OrderItem, OrderPage, OrderStatus, Page};

/// Tables and indexes, applied idempotently at startup.
pub const SCHEMA: &str = include_str!("schema.sql");

const ORDER_COLUMNS: &str = "id, user_id, total, status, created_at";

// ============================================================================
// PostgreSQL Order Store
// ============================================================================

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Order schema applied");
        Ok(())
    }

    /// Items for the given orders, each list in request line order.
    async fn load_items<'c, E>(executor: E, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>, StoreError>
    where
        E: sqlx::PgExecutor<'c>,
    {
        let rows = sqlx::query(
            "SELECT order_id, product_id, quantity, unit_price
             FROM order_items
             WHERE order_id = ANY($1)
             ORDER BY order_id, position",
        )
        .bind(order_ids.to_vec())
        .fetch_all(executor)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items.entry(order_id).or_default().push(OrderItem {
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
                unit_price: row.try_get("unit_price")?,
            });
        }
        Ok(items)
    }
}

fn order_from_row(row: &PgRow, items: &mut HashMap<Uuid, Vec<OrderItem>>) -> Result<Order, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("order {id} has status {status:?}")))?;

    let items = items.remove(&id).unwrap_or_default();
    if items.is_empty() {
        return Err(StoreError::Corrupt(format!("order {id} has no items")));
    }

    Ok(Order {
        id,
        user_id: row.try_get("user_id")?,
        items,
        total: row.try_get::<Decimal, _>("total")?,
        status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: NewOrder, deadline: Instant) -> Result<Order, StoreError> {
        // A saturated pool must not hold the write past the caller's deadline.
        let mut tx = timeout_at(deadline, self.pool.begin())
            .await
            .map_err(|_| StoreError::DeadlineExceeded)??;

        // Dropping `tx` on any early return rolls the whole order back.

        let row = sqlx::query(
            "INSERT INTO orders (id, user_id, total, status)
             VALUES ($1, $2, $3, $4)
             RETURNING created_at",
        )
        .bind(order.id)
        .bind(&order.user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, position, quantity, unit_price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id)
            .bind(&item.product_id)
            .bind(position as i32)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            items = order.items.len(),
            "Committed order and items"
        );

        Ok(order.into_order(created_at))
    }

    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, StoreError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut items = Self::load_items(&self.pool, &[id]).await?;
        order_from_row(&row, &mut items)
    }

    async fn list_orders_by_user(&self, user_id: &str, page: Page) -> Result<OrderPage, StoreError> {
        // Count and page come from one snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?
            .try_get("total")?;

        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&mut *tx)
            .await?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()?;
        let mut items = Self::load_items(&mut *tx, &ids).await?;
        tx.commit().await?;

        let orders = rows
            .iter()
            .map(|row| order_from_row(row, &mut items))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderPage { orders, total })
    }
}
