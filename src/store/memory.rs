use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use super::{OrderStore, StoreError};
use crate::domain::order::{NewOrder, Order, OrderPage, Page};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Process-local store for development (`ORDER_STORE=memory`) and tests.
// Item rows are staged and checked before anything becomes visible, which
// gives the same all-or-nothing behaviour as the Postgres transaction.
//
// ============================================================================

struct StoredOrder {
    order: Order,
    seq: u64,
}

#[derive(Default)]
struct MemoryState {
    orders: HashMap<Uuid, StoredOrder>,
    next_seq: u64,
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    state: RwLock<MemoryState>,
    referenced_products: Option<HashSet<String>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce a foreign key from item rows to this fixed set of product ids.
    pub fn with_referenced_products<I, S>(product_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: RwLock::default(),
            referenced_products: Some(product_ids.into_iter().map(Into::into).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_items(&self, order: &NewOrder) -> Result<(), StoreError> {
        let mut keys = HashSet::with_capacity(order.items.len());
        for (position, item) in order.items.iter().enumerate() {
            if !keys.insert(item.product_id.as_str()) {
                return Err(StoreError::Constraint(format!(
                    "duplicate key (order_id, product_id) = ({}, {})",
                    order.id, item.product_id
                )));
            }
            if let Some(known) = &self.referenced_products {
                if !known.contains(&item.product_id) {
                    return Err(StoreError::Constraint(format!(
                        "item {position} references unknown product {}",
                        item.product_id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn newest_first(a: &StoredOrder, b: &StoredOrder) -> std::cmp::Ordering {
    b.order
        .created_at
        .cmp(&a.order.created_at)
        .then_with(|| b.seq.cmp(&a.seq))
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: NewOrder, deadline: Instant) -> Result<Order, StoreError> {
        let mut state = timeout_at(deadline, self.state.write())
            .await
            .map_err(|_| StoreError::DeadlineExceeded)?;

        if state.orders.contains_key(&order.id) {
            return Err(StoreError::Constraint(format!("duplicate order id {}", order.id)));
        }
        self.check_items(&order)?;

        let created_at: DateTime<Utc> = Utc::now();
        let order = order.into_order(created_at);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.orders.insert(
            order.id,
            StoredOrder {
                order: order.clone(),
                seq,
            },
        );

        tracing::debug!(order_id = %order.id, items = order.items.len(), "Stored order in memory");
        Ok(order)
    }

    async fn get_order_by_id(&self, id: Uuid) -> Result<Order, StoreError> {
        self.state
            .read()
            .await
            .orders
            .get(&id)
            .map(|stored| stored.order.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_orders_by_user(&self, user_id: &str, page: Page) -> Result<OrderPage, StoreError> {
        let state = self.state.read().await;

        let mut matching: Vec<&StoredOrder> = state
            .orders
            .values()
            .filter(|stored| stored.order.user_id == user_id)
            .collect();
        matching.sort_by(|a, b| newest_first(a, b));

        let total = matching.len() as i64;
        let orders = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|stored| stored.order.clone())
            .collect();

        Ok(OrderPage { orders, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderItem;
    use std::time::Duration;

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    fn new_order(user_id: &str, products: &[&str]) -> NewOrder {
        let items = products
            .iter()
            .map(|p| OrderItem {
                product_id: p.to_string(),
                quantity: 1,
                unit_price: "2.50".parse().unwrap(),
            })
            .collect();
        NewOrder::pending(user_id.to_string(), items).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryOrderStore::new();
        let created = store.create_order(new_order("u-1", &["p-1", "p-2"]), soon()).await.unwrap();

        let fetched = store.get_order_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.total.to_string(), "5.00");
    }

    #[tokio::test]
    async fn test_missing_order() {
        let store = InMemoryOrderStore::new();
        assert!(matches!(
            store.get_order_by_id(Uuid::new_v4()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_failed_item_leaves_nothing_behind() {
        let store = InMemoryOrderStore::with_referenced_products(["p-1", "p-3"]);
        let order = new_order("u-1", &["p-1", "p-2", "p-3"]);
        let id = order.id;

        assert!(matches!(store.create_order(order, soon()).await, Err(StoreError::Constraint(_))));
        assert!(matches!(store.get_order_by_id(id).await, Err(StoreError::NotFound)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_order_id_rejected() {
        let store = InMemoryOrderStore::new();
        let order = new_order("u-1", &["p-1"]);
        store.create_order(order.clone(), soon()).await.unwrap();

        assert!(matches!(store.create_order(order, soon()).await, Err(StoreError::Constraint(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_counts_all() {
        let store = InMemoryOrderStore::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(store.create_order(new_order("u-1", &["p-1"]), soon()).await.unwrap().id);
        }
        store.create_order(new_order("u-2", &["p-1"]), soon()).await.unwrap();

        let page = store.list_orders_by_user("u-1", Page::new(2, 0)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(
            page.orders.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![ids[2], ids[1]]
        );

        let beyond = store.list_orders_by_user("u-1", Page::new(2, 10)).await.unwrap();
        assert!(beyond.orders.is_empty());
        assert_eq!(beyond.total, 3);
    }

    #[tokio::test]
    async fn test_write_not_begun_by_deadline_is_abandoned() {
        let store = InMemoryOrderStore::new();
        let busy = store.state.write().await;

        let result = store
            .create_order(new_order("u-1", &["p-1"]), Instant::now() + Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(StoreError::DeadlineExceeded)));

        drop(busy);
        assert!(store.is_empty().await);
    }
}
