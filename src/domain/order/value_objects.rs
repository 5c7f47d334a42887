use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Fractional digits carried by every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12,2)` column holds: 9999999999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE);

/// Round half-up to cents and pin the scale so "30" and "30.00" render alike.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// A line of a persisted order. `unit_price` is the catalog price captured at
/// validation time and never follows later catalog changes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// quantity × unit price, rounded once for this line.
    pub fn line_total(&self) -> Result<Decimal, OrderError> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .map(round_money)
            .filter(|total| *total <= MAX_MONEY)
            .ok_or_else(|| {
                OrderError::InvalidArgument(format!(
                    "line total for product {} ({} × {}) exceeds {MAX_MONEY}",
                    self.product_id, self.quantity, self.unit_price
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
    Fulfilled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Fulfilled => "fulfilled",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Fulfilled)
        )
    }

    /// Reserved lifecycle. Nothing in the service moves an order past
    /// `Pending` yet.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::InvalidStatusTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            other => Err(OrderError::Internal(format!("unknown order status: {other}"))),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
