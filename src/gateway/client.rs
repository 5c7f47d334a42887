use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::proto::order as pb;
use crate::proto::order::order_service_client::OrderServiceClient;

/// What the gateway needs from the order service.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, request: pb::CreateOrderRequest) -> Result<pb::OrderResponse, Status>;
    async fn get_order(&self, id: String) -> Result<pb::OrderResponse, Status>;
    async fn get_user_orders(&self, request: pb::GetUserOrdersRequest) -> Result<pb::GetUserOrdersResponse, Status>;
}

/// gRPC client that sends the gateway timeout as each call's deadline.
pub struct GrpcOrderApi {
    client: OrderServiceClient<Channel>,
    timeout: Duration,
}

impl GrpcOrderApi {
    pub fn connect_lazy(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let channel = Endpoint::from_shared(url.to_string())?
            .connect_timeout(Duration::from_secs(3))
            .connect_lazy();
        Ok(Self {
            client: OrderServiceClient::new(channel),
            timeout,
        })
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.timeout);
        request
    }
}

#[async_trait]
impl OrderApi for GrpcOrderApi {
    async fn create_order(&self, request: pb::CreateOrderRequest) -> Result<pb::OrderResponse, Status> {
        let response = self.client.clone().create_order(self.request(request)).await?;
        Ok(response.into_inner())
    }

    async fn get_order(&self, id: String) -> Result<pb::OrderResponse, Status> {
        let response = self
            .client
            .clone()
            .get_order(self.request(pb::GetOrderRequest { id }))
            .await?;
        Ok(response.into_inner())
    }

    async fn get_user_orders(&self, request: pb::GetUserOrdersRequest) -> Result<pb::GetUserOrdersResponse, Status> {
        let response = self.client.clone().get_user_orders(self.request(request)).await?;
        Ok(response.into_inner())
    }
}
