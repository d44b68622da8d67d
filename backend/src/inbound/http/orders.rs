//! Order service endpoints.
//!
//! ```text
//! POST /api/orders               create (optional Idempotency-Key)
//! GET  /api/orders               summaries, newest first
//! GET  /api/orders/{id}          one order with its lines
//! PUT  /api/orders/{id}/status   {"status":"shipped"}
//! GET  /                         dashboard
//! GET  /order/{id}               order page
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Order, OrderDraft, OrderId, OrderReceipt, OrderSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::{
    IDEMPOTENT_REPLAYED_HEADER, extract_idempotency_key, map_idempotency_key_error,
};
use crate::inbound::http::state::OrderState;
use crate::inbound::http::views::{self, html_ok};

/// Create an order. Repeating a request with the same `Idempotency-Key`
/// returns the original order.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderDraft,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "UUID deduplicating retries")
    ),
    responses(
        (status = 201, description = "Order created or replayed", body = OrderReceipt,
            headers(("Idempotent-Replayed" = String, description = "`true` for a replay"))),
        (status = 400, description = "Invalid order", body = Error),
        (status = 409, description = "Key reused with a different payload", body = Error),
        (status = 503, description = "Order store unavailable", body = Error)
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/api/orders")]
pub async fn create_order(
    state: web::Data<OrderState>,
    req: HttpRequest,
    payload: web::Json<OrderDraft>,
) -> ApiResult<HttpResponse> {
    let key = extract_idempotency_key(req.headers()).map_err(map_idempotency_key_error)?;
    let outcome = state.orders.create(payload.into_inner(), key).await?;
    let mut response = HttpResponse::Created();
    if outcome.is_replay() {
        response.insert_header((IDEMPOTENT_REPLAYED_HEADER, "true"));
    }
    Ok(response.json(outcome.order().receipt()))
}

/// Order summaries.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders, newest first", body = [OrderSummary]),
        (status = 503, description = "Order store unavailable", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/api/orders")]
pub async fn list_orders(state: web::Data<OrderState>) -> ApiResult<web::Json<Vec<OrderSummary>>> {
    Ok(web::Json(state.orders.list().await?))
}

/// One order with its lines.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Order", body = Order),
        (status = 404, description = "Order not found", body = Error)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/api/orders/{id}")]
pub async fn get_order(
    state: web::Data<OrderState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Order>> {
    Ok(web::Json(state.orders.get(OrderId::new(path.into_inner())).await?))
}

/// Body of `PUT /api/orders/{id}/status`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// Acknowledgement of a status change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub status: String,
}

/// Overwrite an order's status with any non-blank string.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = i32, Path, description = "Order identifier")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusUpdateResponse),
        (status = 400, description = "Status missing", body = Error),
        (status = 404, description = "Order not found", body = Error)
    ),
    tags = ["orders"],
    operation_id = "updateOrderStatus"
)]
#[put("/api/orders/{id}/status")]
pub async fn update_status(
    state: web::Data<OrderState>,
    path: web::Path<i32>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<web::Json<StatusUpdateResponse>> {
    let raw = payload.into_inner().status.unwrap_or_default();
    let status = state
        .orders
        .update_status(OrderId::new(path.into_inner()), &raw)
        .await?;
    Ok(web::Json(StatusUpdateResponse {
        message: "Order status updated successfully".to_owned(),
        status: status.to_string(),
    }))
}

/// Order dashboard page.
#[get("/")]
pub async fn dashboard(state: web::Data<OrderState>) -> ApiResult<HttpResponse> {
    let orders = state.orders.list().await?;
    Ok(html_ok(views::orders::dashboard(&orders)))
}

/// Order detail page.
#[get("/order/{id}")]
pub async fn order_page(
    state: web::Data<OrderState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let order = state.orders.get(OrderId::new(path.into_inner())).await?;
    Ok(html_ok(views::orders::detail(&order)))
}

/// Register the order routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_order)
        .service(list_orders)
        .service(get_order)
        .service(update_status)
        .service(dashboard)
        .service(order_page);
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
