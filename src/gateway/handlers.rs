use actix_web::{error, web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tonic::Status;

use super::client::OrderApi;
use super::status::{classify, HttpClass};
use crate::domain::order::Page;
use crate::proto::order as pb;

// ============================================================================
// Gateway Routes - JSON over HTTP, forwarded to the order service
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<LineBody>,
}

/// Unknown fields (a client-sent `price`, for one) are dropped.
#[derive(Debug, Deserialize)]
pub struct LineBody {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderItemBody {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderBody {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItemBody>,
    pub total: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListBody {
    pub orders: Vec<OrderBody>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl From<CreateOrderBody> for pb::CreateOrderRequest {
    fn from(body: CreateOrderBody) -> Self {
        pb::CreateOrderRequest {
            user_id: body.user_id,
            items: body
                .items
                .into_iter()
                .map(|line| pb::OrderItemRequest {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

impl From<pb::OrderResponse> for OrderBody {
    fn from(order: pb::OrderResponse) -> Self {
        OrderBody {
            id: order.id,
            user_id: order.user_id,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemBody {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

fn error_body(class: HttpClass, message: &str) -> HttpResponse {
    HttpResponse::build(class.status_code()).json(serde_json::json!({ "error": message }))
}

fn status_response(route: &'static str, status: Status) -> HttpResponse {
    let class = classify(status.code());
    if class == HttpClass::ServerError {
        tracing::error!(route, code = ?status.code(), error = %status.message(), "Order service call failed");
    } else {
        tracing::debug!(route, code = ?status.code(), error = %status.message(), "Order service rejected request");
    }
    error_body(class, status.message())
}

pub async fn create_order(api: web::Data<dyn OrderApi>, body: web::Json<CreateOrderBody>) -> HttpResponse {
    match api.create_order(body.into_inner().into()).await {
        Ok(order) => HttpResponse::Created().json(OrderBody::from(order)),
        Err(status) => status_response("create_order", status),
    }
}

pub async fn get_order(api: web::Data<dyn OrderApi>, path: web::Path<String>) -> HttpResponse {
    match api.get_order(path.into_inner()).await {
        Ok(order) => HttpResponse::Ok().json(OrderBody::from(order)),
        Err(status) => status_response("get_order", status),
    }
}

pub async fn get_user_orders(
    api: web::Data<dyn OrderApi>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let page = Page::new(
        query.limit.map_or(0, i64::from),
        query.offset.map_or(0, i64::from),
    );
    let request = pb::GetUserOrdersRequest {
        user_id: path.into_inner(),
        limit: i32::try_from(page.limit).unwrap_or(i32::MAX),
        offset: i32::try_from(page.offset).unwrap_or(i32::MAX),
    };

    match api.get_user_orders(request).await {
        Ok(response) => HttpResponse::Ok().json(OrderListBody {
            orders: response.orders.into_iter().map(OrderBody::from).collect(),
            total: response.total,
            limit: page.limit,
            offset: page.offset,
        }),
        Err(status) => status_response("get_user_orders", status),
    }
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "api-gateway"
    }))
}

/// Malformed JSON bodies and query strings answer in the same error shape.
fn bad_request(err: impl std::fmt::Display, _req: &HttpRequest) -> error::Error {
    let message = err.to_string();
    error::InternalError::from_response(message.clone(), error_body(HttpClass::BadRequest, &message)).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| bad_request(err, req)))
        .app_data(web::QueryConfig::default().error_handler(|err, req| bad_request(err, req)))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/api/v1")
                .route("/orders", web::post().to(create_order))
                .route("/orders/{id}", web::get().to(get_order))
                .route("/users/{id}/orders", web::get().to(get_user_orders)),
        );
}
