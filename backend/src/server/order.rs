//! Order service assembly.

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use super::{OrderSettings, StartupError, connect_store};
use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::OrderApiDoc;
use crate::domain::OrderService;
use crate::domain::ports::OrderRepository;
use crate::inbound::http::error::{json_config, path_config, query_config};
use crate::inbound::http::health::{HealthState, health, live, ready};
use crate::inbound::http::orders;
use crate::inbound::http::state::OrderState;
use crate::outbound::memory::InMemoryOrderRepository;
use crate::outbound::persistence::{DieselOrderRepository, MigrationSet};

/// Name reported by `/health`.
pub const ORDER_SERVICE: &str = "order-service";

/// Build order state from settings.
///
/// # Errors
/// Returns [`StartupError`] when the store cannot be prepared.
pub async fn build_order_state(settings: &OrderSettings) -> Result<OrderState, StartupError> {
    let repository: Arc<dyn OrderRepository> = match connect_store(
        ORDER_SERVICE,
        settings.database_url.as_deref(),
        settings.db_max_connections(),
        MigrationSet::Orders,
    )
    .await?
    {
        Some(pool) => Arc::new(DieselOrderRepository::new(pool)),
        None => Arc::new(InMemoryOrderRepository::new()),
    };
    Ok(OrderState::new(OrderService::new(
        repository,
        Arc::new(DefaultClock),
    )))
}

/// Order application with tracing and health checks.
pub fn order_app(
    state: web::Data<OrderState>,
    health_state: web::Data<HealthState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .configure(orders::configure)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app =
        app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", OrderApiDoc::openapi()));

    app
}

/// Bind the order service.
///
/// # Errors
/// Returns [`StartupError`] when state cannot be built or the socket cannot
/// be bound.
pub async fn order_server(settings: &OrderSettings) -> Result<Server, StartupError> {
    let state = web::Data::new(build_order_state(settings).await?);
    let health_state = web::Data::new(HealthState::new(ORDER_SERVICE));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || order_app(state.clone(), server_health_state.clone()))
        .bind(settings.bind_addr())?
        .run();

    health_state.mark_ready();
    info!(addr = settings.bind_addr(), "order service listening");
    Ok(server)
}
