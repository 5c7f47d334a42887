// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, money rounding)
// - Commands (CreateOrder, LineRequest, Page)
// - Errors (OrderError, StatusKind)
// - Aggregate (NewOrder, Order, OrderPage)
// - Orchestrator (OrderOrchestrator)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod orchestrator;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use orchestrator::*;
