use std::collections::HashSet;

use super::errors::OrderError;

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

/// Page size used when the caller sends none (or a non-positive one).
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// One requested line. Carries no price: prices only ever come from the
/// product catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: String,
    pub items: Vec<LineRequest>,
}

impl CreateOrder {
    /// Shape checks that need no remote call.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.user_id.trim().is_empty() {
            return Err(OrderError::InvalidArgument("user_id is required".to_string()));
        }
        if self.items.is_empty() {
            return Err(OrderError::InvalidArgument(
                "at least one order item is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(OrderError::InvalidArgument("product_id is required".to_string()));
            }
            if line.quantity <= 0 {
                return Err(OrderError::InvalidArgument(format!(
                    "invalid quantity {} for product {}",
                    line.quantity, line.product_id
                )));
            }
            // (order_id, product_id) is the item key
            if !seen.insert(line.product_id.as_str()) {
                return Err(OrderError::InvalidArgument(format!(
                    "product {} appears more than once",
                    line.product_id
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: if limit <= 0 { DEFAULT_PAGE_LIMIT } else { limit },
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, quantity: i32) -> LineRequest {
        LineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn command(user_id: &str, items: Vec<LineRequest>) -> CreateOrder {
        CreateOrder {
            user_id: user_id.to_string(),
            items,
        }
    }

    #[test]
    fn test_valid_command_passes() {
        assert!(command("u-1", vec![line("p-1", 1), line("p-2", 4)]).validate().is_ok());
    }

    #[test]
    fn test_shape_violations() {
        let cases = vec![
            command("", vec![line("p-1", 1)]),
            command("   ", vec![line("p-1", 1)]),
            command("u-1", vec![]),
            command("u-1", vec![line("p-1", 0)]),
            command("u-1", vec![line("p-1", 2), line("p-2", -3)]),
            command("u-1", vec![line("", 1)]),
            command("u-1", vec![line("p-1", 1), line("p-1", 2)]),
        ];

        for cmd in cases {
            assert!(
                matches!(cmd.validate(), Err(OrderError::InvalidArgument(_))),
                "expected InvalidArgument for {cmd:?}"
            );
        }
    }

    #[test]
    fn test_page_defaults() {
        assert_eq!(Page::new(0, 0), Page { limit: 10, offset: 0 });
        assert_eq!(Page::new(-5, -1), Page { limit: 10, offset: 0 });
        assert_eq!(Page::new(2, 4), Page { limit: 2, offset: 4 });
        assert_eq!(Page::default(), Page { limit: 10, offset: 0 });
    }
}
