// ============================================================================
// HTTP Gateway
// ============================================================================
//
// Translates JSON over HTTP into OrderService calls and gRPC status codes
// back into HTTP statuses. Holds no business rules: prices, stock and
// existence are all decided behind the order service.
//
// ============================================================================

mod client;
mod handlers;
mod status;

pub use client::{GrpcOrderApi, OrderApi};
pub use handlers::{configure, CreateOrderBody, OrderBody, OrderItemBody, OrderListBody};
pub use status::{classify, HttpClass};
