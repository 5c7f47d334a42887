//! Fixed in-process collaborators for service-level tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;

use super::{CollaboratorError, ProductCatalog, ProductSnapshot, UserDirectory};

/// Knows exactly the listed user ids.
pub(crate) struct StaticUsers(pub Vec<&'static str>);

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn user_exists(&self, user_id: &str) -> Result<bool, CollaboratorError> {
        Ok(self.0.contains(&user_id))
    }
}

/// P1 at 10.00 (stock 5) and P2 at 19.99 (stock 10); nothing else exists.
#[derive(Default)]
pub(crate) struct StaticCatalog {
    pub delay: Option<Duration>,
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn get_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, CollaboratorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let product = match product_id {
            "P1" => Some(("10.00", 5)),
            "P2" => Some(("19.99", 10)),
            _ => None,
        };
        Ok(product.map(|(price, stock)| ProductSnapshot {
            product_id: product_id.to_string(),
            unit_price: price.parse::<Decimal>().unwrap(),
            stock,
        }))
    }
}
