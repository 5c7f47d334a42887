use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use super::{CollaboratorError, ProductCatalog, ProductSnapshot, UserDirectory, PRODUCT_SERVICE, USER_SERVICE};
use crate::domain::order::{round_money, MAX_MONEY, MONEY_SCALE};
use crate::proto::product::product_service_client::ProductServiceClient;
use crate::proto::product::GetProductRequest;
use crate::proto::user::user_service_client::UserServiceClient;
use crate::proto::user::GetUserRequest;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

fn lazy_channel(url: &str) -> anyhow::Result<Channel> {
    Ok(Endpoint::from_shared(url.to_string())?
        .connect_timeout(CONNECT_TIMEOUT)
        .connect_lazy())
}

/// Collapse breaker outcomes into collaborator errors.
fn unwrap_breaker<T>(
    service: &'static str,
    result: Result<T, CircuitBreakerError<Status>>,
) -> Result<T, CollaboratorError> {
    match result {
        Ok(value) => Ok(value),
        Err(CircuitBreakerError::CircuitOpen) => Err(CollaboratorError::CircuitOpen(service)),
        Err(CircuitBreakerError::OperationFailed(status)) => Err(CollaboratorError::Unavailable {
            service,
            message: format!("{:?}: {}", status.code(), status.message()),
        }),
    }
}

/// Parse a catalog price, refusing anything finer than cents or larger than
/// the store can hold.
pub(crate) fn parse_price(raw: &str) -> Result<Decimal, CollaboratorError> {
    let price: Decimal = raw.trim().parse().map_err(|e| CollaboratorError::Malformed {
        service: PRODUCT_SERVICE,
        message: format!("price {raw:?}: {e}"),
    })?;

    if price.round_dp(MONEY_SCALE) != price {
        return Err(CollaboratorError::Malformed {
            service: PRODUCT_SERVICE,
            message: format!("price {raw:?} has more than {MONEY_SCALE} fractional digits"),
        });
    }

    if price > MAX_MONEY {
        return Err(CollaboratorError::Malformed {
            service: PRODUCT_SERVICE,
            message: format!("price {raw:?} exceeds {MAX_MONEY}"),
        });
    }

    Ok(round_money(price))
}

// ============================================================================
// User Directory over gRPC
// ============================================================================

pub struct GrpcUserDirectory {
    client: UserServiceClient<Channel>,
    breaker: CircuitBreaker,
}

impl GrpcUserDirectory {
    pub fn connect_lazy(url: &str, breaker: CircuitBreakerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: UserServiceClient::new(lazy_channel(url)?),
            breaker: CircuitBreaker::new(USER_SERVICE, breaker),
        })
    }
}

#[async_trait]
impl UserDirectory for GrpcUserDirectory {
    async fn user_exists(&self, user_id: &str) -> Result<bool, CollaboratorError> {
        let mut client = self.client.clone();
        let request = GetUserRequest {
            id: user_id.to_string(),
        };

        let result = self
            .breaker
            .call(async move {
                match client.get_user(request).await {
                    Ok(_) => Ok(true),
                    Err(status) if status.code() == Code::NotFound => Ok(false),
                    Err(status) => Err(status),
                }
            })
            .await;

        let exists = unwrap_breaker(USER_SERVICE, result)?;
        tracing::debug!(user_id = %user_id, exists, "User lookup");
        Ok(exists)
    }
}

// ============================================================================
// Product Catalog over gRPC
// ============================================================================

pub struct GrpcProductCatalog {
    client: ProductServiceClient<Channel>,
    breaker: CircuitBreaker,
}

impl GrpcProductCatalog {
    pub fn connect_lazy(url: &str, breaker: CircuitBreakerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: ProductServiceClient::new(lazy_channel(url)?),
            breaker: CircuitBreaker::new(PRODUCT_SERVICE, breaker),
        })
    }
}

#[async_trait]
impl ProductCatalog for GrpcProductCatalog {
    async fn get_product(&self, product_id: &str) -> Result<Option<ProductSnapshot>, CollaboratorError> {
        let mut client = self.client.clone();
        let request = GetProductRequest {
            id: product_id.to_string(),
        };

        let result = self
            .breaker
            .call(async move {
                match client.get_product(request).await {
                    Ok(response) => Ok(Some(response.into_inner())),
                    Err(status) if status.code() == Code::NotFound => Ok(None),
                    Err(status) => Err(status),
                }
            })
            .await;

        let Some(product) = unwrap_breaker(PRODUCT_SERVICE, result)? else {
            tracing::debug!(product_id = %product_id, "Product not in catalog");
            return Ok(None);
        };

        let snapshot = ProductSnapshot {
            product_id: product_id.to_string(),
            unit_price: parse_price(&product.price)?,
            stock: i64::from(product.stock),
        };

        tracing::debug!(
            product_id = %product_id,
            unit_price = %snapshot.unit_price,
            stock = snapshot.stock,
            "Product lookup"
        );

        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("19.99").unwrap().to_string(), "19.99");
        assert_eq!(parse_price("10").unwrap().to_string(), "10.00");
        assert_eq!(parse_price(" 5.5 ").unwrap().to_string(), "5.50");
        assert_eq!(parse_price("19.990").unwrap().to_string(), "19.99");
    }

    #[test]
    fn test_parse_price_rejects_malformed() {
        assert!(matches!(parse_price("abc"), Err(CollaboratorError::Malformed { .. })));
        assert!(matches!(parse_price("1.005"), Err(CollaboratorError::Malformed { .. })));
        assert!(matches!(parse_price(""), Err(CollaboratorError::Malformed { .. })));
    }

    #[test]
    fn test_parse_price_bounded_by_column_range() {
        assert_eq!(parse_price("9999999999.99").unwrap(), MAX_MONEY);
        for oversized in ["10000000000.00", "792281625142643375935439503.35"] {
            assert!(
                matches!(parse_price(oversized), Err(CollaboratorError::Malformed { .. })),
                "{oversized}"
            );
        }
    }

    #[test]
    fn test_breaker_outcomes() {
        let open = unwrap_breaker::<bool>(USER_SERVICE, Err(CircuitBreakerError::CircuitOpen));
        assert!(matches!(open, Err(CollaboratorError::CircuitOpen(USER_SERVICE))));

        let failed = unwrap_breaker::<bool>(
            USER_SERVICE,
            Err(CircuitBreakerError::OperationFailed(Status::unavailable("down"))),
        );
        match failed {
            Err(CollaboratorError::Unavailable { service, message }) => {
                assert_eq!(service, USER_SERVICE);
                assert!(message.contains("down"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(unwrap_breaker(USER_SERVICE, Ok(true)).unwrap());
    }

    #[tokio::test]
    async fn test_lazy_clients_build_without_server() {
        let config = CircuitBreakerConfig::default();
        assert!(GrpcUserDirectory::connect_lazy("http://127.0.0.1:1", config.clone()).is_ok());
        assert!(GrpcProductCatalog::connect_lazy("http://127.0.0.1:1", config).is_ok());
    }
}
