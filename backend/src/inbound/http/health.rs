//! Health endpoints shared by every storefront service.
//!
//! `/health` answers with the service name for humans and smoke tests;
//! `/health/live` and `/health/ready` are the orchestrator health checks.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

/// Readiness and liveness flags for one service.
pub struct HealthState {
    service: &'static str,
    ready: AtomicBool,
    live: AtomicBool,
}

impl HealthState {
    /// Create state for `service`, starting live but not ready.
    #[must_use]
    pub const fn new(service: &'static str) -> Self {
        Self {
            service,
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }

    /// Name reported by `/health`.
    #[must_use]
    pub const fn service(&self) -> &'static str {
        self.service
    }

    /// Mark the service as ready once its stores and bootstrap are done.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so health checks drain the instance during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Readiness flag.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Liveness flag.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn status_response(healthy: bool) -> HttpResponse {
        let mut response = if healthy {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Body returned by `/health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    /// Always `healthy` while the process is alive.
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Reporting service.
    #[schema(example = "order-service")]
    pub service: &'static str,
}

/// Service identity check.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses(
        (status = 200, description = "Service is running", body = HealthReport),
        (status = 503, description = "Service is shutting down")
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    if !state.is_alive() {
        return HealthState::status_response(false);
    }
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(HealthReport {
            status: "healthy",
            service: state.service(),
        })
}

/// Readiness check: 200 once stores are initialised, 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::status_response(state.is_ready())
}

/// Liveness check: 200 while alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::status_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn readiness_follows_state() {
        let state = web::Data::new(HealthState::new("cart-service"));
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .service(ready)
                .service(live),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.mark_ready();
        let res = test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-store")
        );

        state.mark_unhealthy();
        let res = test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn health_names_the_service() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HealthState::new("order-service")))
                .service(health),
        )
        .await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(body, json!({"status": "healthy", "service": "order-service"}));
    }
}
