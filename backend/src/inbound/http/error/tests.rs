//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("reused key"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn body_of(response: HttpResponse) -> Error {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(expected_trace_id: String) {
    let error = Error::internal("order store failed: connection reset by 10.0.0.4")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({"secret": "x"}));
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .expect("trace id header")
        .to_str()
        .expect("ascii header")
        .to_owned();
    assert_eq!(header, expected_trace_id);

    let payload = body_of(response).await;
    assert_eq!(payload.code(), ErrorCode::InternalError);
    assert_eq!(payload.message(), "Internal server error");
    assert_eq!(payload.trace_id(), Some(TRACE_ID));
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let error = Error::invalid_request("bad").with_details(json!({"field": "name"}));
    let response = ResponseError::error_response(&error);
    assert!(response.headers().get(TRACE_ID_HEADER).is_none());
    assert_eq!(
        response.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("no-store")
    );

    let payload = body_of(response).await;
    assert_eq!(payload.message(), "bad");
    assert_eq!(payload.trace_id(), None);
    assert_eq!(payload.details(), Some(&json!({"field": "name"})));
}

#[rstest]
fn unavailable_responses_ask_clients_to_retry() {
    let response = ResponseError::error_response(&Error::service_unavailable("down"));
    assert_eq!(
        response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
        Some(RETRY_AFTER_SECS)
    );
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}

#[actix_web::test]
async fn malformed_json_bodies_use_the_error_envelope() {
    use actix_web::{App, test as actix_test, web};

    #[derive(serde::Deserialize)]
    struct Body {
        #[allow(dead_code, reason = "only parsed")]
        name: String,
    }

    let app = actix_test::init_service(App::new().app_data(json_config()).route(
        "/",
        web::post().to(|_: web::Json<Body>| async { HttpResponse::Ok().finish() }),
    ))
    .await;
    let request = actix_test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload: Error = actix_test::read_body_json(response).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert!(payload.message().starts_with("malformed request"));
}
