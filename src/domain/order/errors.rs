use super::value_objects::OrderStatus;
use crate::clients::CollaboratorError;
use crate::store::StoreError;

// ============================================================================
// Order Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i32,
        available: i64,
    },

    #[error("cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("deadline exceeded while {0}")]
    DeadlineExceeded(&'static str),

    #[error("{context}: {source}")]
    Collaborator {
        context: &'static str,
        #[source]
        source: CollaboratorError,
    },

    #[error("order store failure: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

/// The status taxonomy exposed to callers of the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    DeadlineExceeded,
    Internal,
}

impl OrderError {
    pub fn kind(&self) -> StatusKind {
        match self {
            OrderError::InvalidArgument(_) => StatusKind::InvalidArgument,
            OrderError::UserNotFound(_)
            | OrderError::ProductNotFound(_)
            | OrderError::OrderNotFound(_) => StatusKind::NotFound,
            OrderError::InsufficientStock { .. }
            | OrderError::InvalidStatusTransition { .. }
            | OrderError::Store(StoreError::Constraint(_)) => StatusKind::FailedPrecondition,
            OrderError::DeadlineExceeded(_) | OrderError::Store(StoreError::DeadlineExceeded) => {
                StatusKind::DeadlineExceeded
            }
            OrderError::Collaborator { .. } | OrderError::Store(_) | OrderError::Internal(_) => {
                StatusKind::Internal
            }
        }
    }

    /// Whether a caller may resend the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), StatusKind::DeadlineExceeded | StatusKind::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            OrderError::InvalidArgument("x".into()).kind(),
            StatusKind::InvalidArgument
        );
        assert_eq!(OrderError::UserNotFound("u".into()).kind(), StatusKind::NotFound);
        assert_eq!(OrderError::ProductNotFound("p".into()).kind(), StatusKind::NotFound);
        assert_eq!(OrderError::OrderNotFound("o".into()).kind(), StatusKind::NotFound);
        assert_eq!(
            OrderError::InsufficientStock {
                product_id: "p".into(),
                requested: 3,
                available: 1
            }
            .kind(),
            StatusKind::FailedPrecondition
        );
        assert_eq!(
            OrderError::DeadlineExceeded("checking user").kind(),
            StatusKind::DeadlineExceeded
        );
        assert_eq!(
            OrderError::Store(StoreError::Constraint("fk".into())).kind(),
            StatusKind::FailedPrecondition
        );
        assert_eq!(OrderError::Store(StoreError::NotFound).kind(), StatusKind::Internal);
        assert_eq!(
            OrderError::Store(StoreError::DeadlineExceeded).kind(),
            StatusKind::DeadlineExceeded
        );
        assert_eq!(
            OrderError::Collaborator {
                context: "user lookup failed",
                source: CollaboratorError::CircuitOpen("user-service"),
            }
            .kind(),
            StatusKind::Internal
        );
    }

    #[test]
    fn test_absent_and_failed_lookups_stay_distinct() {
        let absent = OrderError::UserNotFound("u-1".into());
        let failed = OrderError::Collaborator {
            context: "user lookup failed",
            source: CollaboratorError::Unavailable {
                service: "user-service",
                message: "connection refused".into(),
            },
        };
        assert_ne!(absent.kind(), failed.kind());
        assert!(!absent.is_retryable());
        assert!(failed.is_retryable());
        assert!(failed.to_string().contains("connection refused"));
    }
}
