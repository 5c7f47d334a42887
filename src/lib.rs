pub mod clients;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod metrics;
pub mod proto;
pub mod store;
pub mod telemetry;
pub mod transport;
pub mod utils;
