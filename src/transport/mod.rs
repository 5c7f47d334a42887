// Private module declarations
mod grpc;
mod status;

pub use grpc::{order_to_response, OrderGrpcService};
pub use status::parse_grpc_timeout;
