// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order service
// ============================================================================
//
// - RPC throughput and latency per method, labelled with the result code
// - Orders created and their line counts
//
// Served as text on /metrics by the actix-web server in `server.rs`.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub rpc_requests: IntCounterVec,
    pub rpc_duration: HistogramVec,

    pub orders_created: IntCounter,
    pub order_line_items: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let rpc_requests = IntCounterVec::new(
            Opts::new("order_rpc_requests_total", "Order service RPCs by method and result code"),
            &["method", "code"],
        )?;
        registry.register(Box::new(rpc_requests.clone()))?;

        let rpc_duration = HistogramVec::new(
            HistogramOpts::new("order_rpc_duration_seconds", "Order service RPC latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
            &["method"],
        )?;
        registry.register(Box::new(rpc_duration.clone()))?;

        let orders_created = IntCounter::new("orders_created_total", "Orders committed")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_line_items = Histogram::with_opts(
            HistogramOpts::new("order_line_items", "Line items per created order")
                .buckets(vec![1.0, 2.0, 3.0, 5.0, 10.0, 25.0, 50.0]),
        )?;
        registry.register(Box::new(order_line_items.clone()))?;

        Ok(Self {
            registry,
            rpc_requests,
            rpc_duration,
            orders_created,
            order_line_items,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_rpc(&self, method: &str, code: tonic::Code, duration_secs: f64) {
        self.rpc_requests
            .with_label_values(&[method, code_label(code)])
            .inc();
        self.rpc_duration.with_label_values(&[method]).observe(duration_secs);
    }

    pub fn record_order_created(&self, line_items: usize) {
        self.orders_created.inc();
        self.order_line_items.observe(line_items as f64);
    }
}

fn code_label(code: tonic::Code) -> &'static str {
    match code {
        tonic::Code::Ok => "ok",
        tonic::Code::InvalidArgument => "invalid_argument",
        tonic::Code::NotFound => "not_found",
        tonic::Code::FailedPrecondition => "failed_precondition",
        tonic::Code::DeadlineExceeded => "deadline_exceeded",
        tonic::Code::Internal => "internal",
        _ => "other",
    }
}
