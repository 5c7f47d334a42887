use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderStatus, MAX_MONEY};

// ============================================================================
// Order Aggregate
// ============================================================================
//
// An order is written once by the orchestrator and read back unchanged.
// `NewOrder` is the fully validated order before the store stamps
// `created_at`; `Order` is what the store hands back.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: Uuid,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One page of a user's orders, newest first, plus the user's full count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
}

/// Sum of per-line totals, each already rounded to cents. Fails rather than
/// produce a total the store cannot hold.
pub fn compute_total(items: &[OrderItem]) -> Result<Decimal, OrderError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total
            .checked_add(item.line_total()?)
            .filter(|sum| *sum <= MAX_MONEY)
            .ok_or_else(|| OrderError::InvalidArgument(format!("order total exceeds {MAX_MONEY}")))
    })
}

impl NewOrder {
    /// Build a pending order with a fresh id and its computed total.
    pub fn pending(user_id: String, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        Self::validate_items(&items)?;

        let total = compute_total(&items)?;
        if total <= Decimal::ZERO {
            return Err(OrderError::InvalidArgument(format!(
                "order total must be positive, got {total}"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
        })
    }

    pub fn into_order(self, created_at: DateTime<Utc>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items: self.items,
            total: self.total,
            status: self.status,
            created_at,
        }
    }

    fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
        if items.is_empty() {
            return Err(OrderError::InvalidArgument("order items cannot be empty".to_string()));
        }

        for item in items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidArgument(format!(
                    "invalid quantity {} for product {}",
                    item.quantity, item.product_id
                )));
            }
            if item.unit_price <= Decimal::ZERO {
                return Err(OrderError::InvalidArgument(format!(
                    "invalid unit price {} for product {}",
                    item.unit_price, item.product_id
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
