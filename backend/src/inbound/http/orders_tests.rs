//! Tests for order HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test};
use mockable::DefaultClock;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{MockOrderRepository, NewOrder, OrderRepositoryError, StoredOrder};
use crate::domain::{OrderNumber, OrderService, PayloadHash};
use crate::outbound::memory::InMemoryOrderRepository;
use crate::inbound::http::error::{json_config, path_config};
use crate::inbound::http::idempotency::IDEMPOTENCY_KEY_HEADER;

const KEY: &str = "550e8400-e29b-41d4-a716-446655440000";

fn draft_json() -> Value {
    json!({
        "session_id": "s1",
        "items": [
            {"album_id": 1, "album_name": "Paranoid", "artist": "Black Sabbath", "price": 24.99, "quantity": 2}
        ],
        "total": 49.98
    })
}

fn stored(new_order: &NewOrder) -> Order {
    Order {
        id: OrderId::new(7),
        order_number: new_order.order_number.clone(),
        session_id: new_order.session_id.clone(),
        total_amount: new_order.total,
        status: new_order.status.clone(),
        created_at: new_order.created_at,
        items: new_order.items.clone(),
        customer: new_order.customer.clone(),
    }
}

macro_rules! order_app {
    ($orders:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(OrderState::new(OrderService::new(
                    Arc::new($orders),
                    Arc::new(DefaultClock),
                ))))
                .app_data(json_config())
                .app_data(path_config())
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn create_returns_receipt() {
    let mut orders = MockOrderRepository::new();
    orders
        .expect_insert()
        .times(1)
        .returning(|new_order| Ok(stored(new_order)));
    let app = order_app!(orders);

    let request = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(draft_json())
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get(IDEMPOTENT_REPLAYED_HEADER).is_none());
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["order_id"], 7);
    assert_eq!(value["status"], "confirmed");
    assert_eq!(value["total"], 49.98);
    assert!(
        value["order_number"]
            .as_str()
            .is_some_and(|number| number.starts_with("ORD-"))
    );
}

#[actix_web::test]
async fn empty_order_is_rejected() {
    let mut orders = MockOrderRepository::new();
    orders.expect_insert().never();
    let app = order_app!(orders);

    let request = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({"session_id": "s1", "items": [], "total": 0}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["message"], "No items in order");
}

#[actix_web::test]
async fn repeated_key_replays_the_original_order() {
    let draft: OrderDraft = serde_json::from_value(draft_json()).expect("draft");
    let hash = PayloadHash::of(&draft).expect("hash");
    let mut orders = MockOrderRepository::new();
    orders.expect_insert().never();
    orders.expect_find_by_idempotency_key().returning(move |_| {
        let new_order = NewOrder {
            order_number: OrderNumber::from_stored("ORD-20240309140507-0042"),
            session_id: Some("s1".to_owned()),
            total: draft.total,
            status: crate::domain::OrderStatus::confirmed(),
            items: draft.items.clone(),
            customer: None,
            idempotency: None,
            created_at: chrono::Utc::now(),
        };
        Ok(Some(StoredOrder {
            order: stored(&new_order),
            payload_hash: hash.clone(),
        }))
    });
    let app = order_app!(orders);

    let request = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header((IDEMPOTENCY_KEY_HEADER, KEY))
        .set_json(draft_json())
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response
            .headers()
            .get(IDEMPOTENT_REPLAYED_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["order_number"], "ORD-20240309140507-0042");
}

#[actix_web::test]
async fn malformed_idempotency_key_is_rejected() {
    let app = order_app!(MockOrderRepository::new());

    let request = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header((IDEMPOTENCY_KEY_HEADER, "not-a-uuid"))
        .set_json(draft_json())
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn status_update_validates_and_reports_missing_orders() {
    let mut orders = MockOrderRepository::new();
    orders
        .expect_update_status()
        .returning(|id, _| Ok(id == OrderId::new(1)));
    let app = order_app!(orders);

    let blank = test::TestRequest::put()
        .uri("/api/orders/1/status")
        .set_json(json!({"status": "  "}))
        .to_request();
    assert_eq!(
        test::call_service(&app, blank).await.status(),
        StatusCode::BAD_REQUEST
    );

    let missing = test::TestRequest::put()
        .uri("/api/orders/2/status")
        .set_json(json!({"status": "shipped"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, missing).await.status(),
        StatusCode::NOT_FOUND
    );

    let ok = test::TestRequest::put()
        .uri("/api/orders/1/status")
        .set_json(json!({"status": "shipped"}))
        .to_request();
    let response = test::call_service(&app, ok).await;
    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = test::read_body_json(response).await;
    assert_eq!(value["status"], "shipped");
}

#[actix_web::test]
async fn unavailable_store_answers_503() {
    let mut orders = MockOrderRepository::new();
    orders
        .expect_list()
        .returning(|| Err(OrderRepositoryError::connection("refused")));
    let app = order_app!(orders);

    let response =
        test::call_service(&app, test::TestRequest::get().uri("/api/orders").to_request()).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn dashboard_renders_html() {
    let mut orders = MockOrderRepository::new();
    orders.expect_list().returning(|| Ok(Vec::new()));
    let app = order_app!(orders);

    let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = test::read_body(response).await;
    assert!(std::str::from_utf8(&body).expect("utf8").contains("No orders yet."));
}

#[actix_web::test]
async fn oversized_prices_are_bad_requests() {
    let mut orders = MockOrderRepository::new();
    orders.expect_insert().never();
    let app = order_app!(orders);

    let request = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "items": [
                {"album_id": 1, "album_name": "A", "artist": "B", "price": 1.0e27, "quantity": 1000}
            ],
            "total": 1.0
        }))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn created_order_reads_back_unchanged() {
    let app = order_app!(InMemoryOrderRepository::new());

    let created = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft_json())
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let receipt: Value = test::read_body_json(created).await;
    let id = receipt["order_id"].as_i64().expect("order id");

    let fetched = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/orders/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let order: Value = test::read_body_json(fetched).await;

    assert_eq!(order["order_number"], receipt["order_number"]);
    assert_eq!(order["total_amount"], json!(49.98));
    assert_eq!(order["items"], draft_json()["items"]);
    assert_eq!(order["status"], "confirmed");
}
