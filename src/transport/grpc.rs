use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tonic::{Code, Request, Response, Status};

use super::status::parse_grpc_timeout;
use crate::domain::order::{CreateOrder, LineRequest, Order, OrderError, OrderOrchestrator, Page, StatusKind};
use crate::metrics::Metrics;
use crate::proto::order as pb;
use crate::proto::order::order_service_server::OrderService;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

// ============================================================================
// Order gRPC Service
// ============================================================================
//
// Thin adapter: proto → command, run the orchestrator under the request
// deadline, domain → proto. Every call is counted and timed.
//
// ============================================================================

pub struct OrderGrpcService {
    orchestrator: Arc<OrderOrchestrator>,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
}

impl OrderGrpcService {
    pub fn new(orchestrator: Arc<OrderOrchestrator>, metrics: Arc<Metrics>, request_timeout: Duration) -> Self {
        Self {
            orchestrator,
            metrics,
            request_timeout,
        }
    }

    /// The client's `grpc-timeout` when present, capped by our own ceiling.
    fn deadline_for<T>(&self, request: &Request<T>) -> Instant {
        let budget = request
            .metadata()
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_grpc_timeout)
            .map_or(self.request_timeout, |client| client.min(self.request_timeout));
        Instant::now() + budget
    }

    fn finish<T>(&self, method: &'static str, started: Instant, result: Result<T, OrderError>) -> Result<Response<T>, Status> {
        let elapsed = started.elapsed().as_secs_f64();
        match result {
            Ok(value) => {
                self.metrics.record_rpc(method, Code::Ok, elapsed);
                Ok(Response::new(value))
            }
            Err(err) => {
                let kind = err.kind();
                if kind == StatusKind::Internal {
                    tracing::error!(method, error = ?err, "Request failed");
                } else {
                    tracing::debug!(method, error = %err, "Request rejected");
                }
                self.metrics.record_rpc(method, kind.code(), elapsed);
                Err(err.into())
            }
        }
    }
}

pub fn order_to_response(order: &Order) -> pb::OrderResponse {
    pb::OrderResponse {
        id: order.id.to_string(),
        user_id: order.user_id.clone(),
        items: order
            .items
            .iter()
            .map(|item| pb::OrderItem {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price.to_string(),
            })
            .collect(),
        total: order.total.to_string(),
        status: order.status.as_str().to_string(),
        created_at: order.created_at.to_rfc3339(),
    }
}

impl From<pb::CreateOrderRequest> for CreateOrder {
    fn from(request: pb::CreateOrderRequest) -> Self {
        CreateOrder {
            user_id: request.user_id,
            items: request
                .items
                .into_iter()
                .map(|item| LineRequest {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[tonic::async_trait]
impl OrderService for OrderGrpcService {
    async fn create_order(&self, request: Request<pb::CreateOrderRequest>) -> Result<Response<pb::OrderResponse>, Status> {
        let started = Instant::now();
        let deadline = self.deadline_for(&request);
        let command = CreateOrder::from(request.into_inner());

        let result = self.orchestrator.create_order(command, deadline).await.map(|order| {
            self.metrics.record_order_created(order.items.len());
            order_to_response(&order)
        });
        self.finish("CreateOrder", started, result)
    }

    async fn get_order(&self, request: Request<pb::GetOrderRequest>) -> Result<Response<pb::OrderResponse>, Status> {
        let started = Instant::now();
        let deadline = self.deadline_for(&request);
        let id = request.into_inner().id;

        let result = self
            .orchestrator
            .get_order(&id, deadline)
            .await
            .map(|order| order_to_response(&order));
        self.finish("GetOrder", started, result)
    }

    async fn get_user_orders(
        &self,
        request: Request<pb::GetUserOrdersRequest>,
    ) -> Result<Response<pb::GetUserOrdersResponse>, Status> {
        let started = Instant::now();
        let deadline = self.deadline_for(&request);
        let request = request.into_inner();
        let page = Page::new(request.limit.into(), request.offset.into());

        let result = self
            .orchestrator
            .get_user_orders(&request.user_id, page, deadline)
            .await
            .map(|page| pb::GetUserOrdersResponse {
                orders: page.orders.iter().map(order_to_response).collect(),
                total: page.total,
            });
        self.finish("GetUserOrders", started, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::{StaticCatalog, StaticUsers};
    use crate::store::InMemoryOrderStore;
    use tonic::metadata::MetadataValue;

    fn service_with(catalog: StaticCatalog, request_timeout: Duration) -> (OrderGrpcService, Arc<Metrics>) {
        let orchestrator = Arc::new(OrderOrchestrator::new(
            Arc::new(StaticUsers(vec!["U1"])),
            Arc::new(catalog),
            Arc::new(InMemoryOrderStore::new()),
        ));
        let metrics = Arc::new(Metrics::new().unwrap());
        (OrderGrpcService::new(orchestrator, metrics.clone(), request_timeout), metrics)
    }

    fn service() -> (OrderGrpcService, Arc<Metrics>) {
        service_with(StaticCatalog { delay: None }, Duration::from_secs(5))
    }

    fn create_request(user_id: &str, items: &[(&str, i32)]) -> pb::CreateOrderRequest {
        pb::CreateOrderRequest {
            user_id: user_id.to_string(),
            items: items
                .iter()
                .map(|(product_id, quantity)| pb::OrderItemRequest {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_order_returns_priced_pending_order() {
        let (service, metrics) = service();

        let response = service
            .create_order(Request::new(create_request("U1", &[("P1", 2), ("P2", 1)])))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.user_id, "U1");
        assert_eq!(response.total, "39.99");
        assert_eq!(response.status, "pending");
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].unit_price, "10.00");
        assert_eq!(response.items[1].unit_price, "19.99");
        assert!(uuid::Uuid::parse_str(&response.id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&response.created_at).is_ok());

        assert_eq!(metrics.orders_created.get(), 1);
        assert_eq!(
            metrics.rpc_requests.with_label_values(&["CreateOrder", "ok"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_create_order_maps_domain_errors_to_codes() {
        let (service, metrics) = service();

        let cases = [
            (create_request("", &[("P1", 1)]), Code::InvalidArgument),
            (create_request("U1", &[]), Code::InvalidArgument),
            (create_request("U1", &[("P1", 0)]), Code::InvalidArgument),
            (create_request("ghost", &[("P1", 1)]), Code::NotFound),
            (create_request("U1", &[("P404", 1)]), Code::NotFound),
            (create_request("U1", &[("P1", 6)]), Code::FailedPrecondition),
        ];
        for (request, expected) in cases {
            let status = service.create_order(Request::new(request)).await.unwrap_err();
            assert_eq!(status.code(), expected, "{}", status.message());
        }

        assert_eq!(metrics.orders_created.get(), 0);
        assert_eq!(
            metrics
                .rpc_requests
                .with_label_values(&["CreateOrder", "invalid_argument"])
                .get(),
            3
        );
    }

    #[tokio::test]
    async fn test_get_order_round_trips_created_order() {
        let (service, _) = service();
        let created = service
            .create_order(Request::new(create_request("U1", &[("P2", 2)])))
            .await
            .unwrap()
            .into_inner();

        let fetched = service
            .get_order(Request::new(pb::GetOrderRequest { id: created.id.clone() }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(fetched, created);

        let missing = service
            .get_order(Request::new(pb::GetOrderRequest {
                id: uuid::Uuid::new_v4().to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(missing.code(), Code::NotFound);

        let empty = service
            .get_order(Request::new(pb::GetOrderRequest { id: String::new() }))
            .await
            .unwrap_err();
        assert_eq!(empty.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_get_user_orders_pages_newest_first() {
        let (service, _) = service();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let order = service
                .create_order(Request::new(create_request("U1", &[("P1", 1)])))
                .await
                .unwrap()
                .into_inner();
            ids.push(order.id);
        }

        let page = service
            .get_user_orders(Request::new(pb::GetUserOrdersRequest {
                user_id: "U1".to_string(),
                limit: 2,
                offset: 0,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.total, 3);
        assert_eq!(page.orders.len(), 2);
        assert_eq!(page.orders[0].id, ids[2]);
        assert_eq!(page.orders[1].id, ids[1]);

        // Non-positive limit falls back to the default page size.
        let page = service
            .get_user_orders(Request::new(pb::GetUserOrdersRequest {
                user_id: "U1".to_string(),
                limit: 0,
                offset: -4,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.orders.len(), 3);
    }

    #[tokio::test]
    async fn test_client_timeout_shorter_than_ceiling_wins() {
        let (service, metrics) = service_with(
            StaticCatalog {
                delay: Some(Duration::from_millis(200)),
            },
            Duration::from_secs(5),
        );

        let mut request = Request::new(create_request("U1", &[("P1", 1)]));
        request
            .metadata_mut()
            .insert(GRPC_TIMEOUT_HEADER, MetadataValue::from_static("20m"));

        let status = service.create_order(request).await.unwrap_err();
        assert_eq!(status.code(), Code::DeadlineExceeded);
        assert_eq!(
            metrics
                .rpc_requests
                .with_label_values(&["CreateOrder", "deadline_exceeded"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_ceiling_bounds_generous_client_timeout() {
        let (service, _) = service_with(
            StaticCatalog {
                delay: Some(Duration::from_millis(200)),
            },
            Duration::from_millis(20),
        );

        let mut request = Request::new(create_request("U1", &[("P1", 1)]));
        request
            .metadata_mut()
            .insert(GRPC_TIMEOUT_HEADER, MetadataValue::from_static("10S"));

        let status = service.create_order(request).await.unwrap_err();
        assert_eq!(status.code(), Code::DeadlineExceeded);
    }
}
