//! Cart service assembly.

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use super::{CartSettings, StartupError, connect_store, session_middleware};
use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::CartApiDoc;
use crate::domain::ports::CartRepository;
use crate::domain::{
    CartService, CheckoutPorts, CheckoutService, SimulatedPaymentGate, TokioSleeper,
};
use crate::inbound::http::cart;
use crate::inbound::http::error::{form_config, json_config, path_config, query_config};
use crate::inbound::http::health::{HealthState, health, live, ready};
use crate::inbound::http::session_config::SessionSettings;
use crate::inbound::http::state::CartState;
use crate::outbound::http::{HttpCatalogClient, HttpOrderClient, ServiceEndpoint};
use crate::outbound::memory::InMemoryCartRepository;
use crate::outbound::persistence::{DieselCartRepository, MigrationSet};

/// Name reported by `/health`.
pub const CART_SERVICE: &str = "cart-service";

/// Build cart and checkout state from settings.
///
/// Catalogue reads and order creation both retry transient failures; order
/// retries are safe because every attempt carries the checkout's
/// idempotency key.
///
/// # Errors
/// Returns [`StartupError`] when the store or clients cannot be prepared.
pub async fn build_cart_state(settings: &CartSettings) -> Result<CartState, StartupError> {
    let carts: Arc<dyn CartRepository> = match connect_store(
        CART_SERVICE,
        settings.database_url.as_deref(),
        settings.db_max_connections(),
        MigrationSet::Cart,
    )
    .await?
    {
        Some(pool) => Arc::new(DieselCartRepository::new(pool)),
        None => Arc::new(InMemoryCartRepository::new()),
    };
    let timeout = settings.http_timeout();
    let retry = settings.retry_policy();
    let catalog = HttpCatalogClient::new(
        ServiceEndpoint::new(settings.store_service_url(), timeout)?.with_retry(retry),
    );
    let orders = HttpOrderClient::new(
        ServiceEndpoint::new(settings.order_service_url(), timeout)?.with_retry(retry),
    );

    let cart = CartService::new(Arc::clone(&carts), Arc::new(catalog));
    let checkout = CheckoutService::new(CheckoutPorts {
        carts,
        orders: Arc::new(orders),
        payments: Arc::new(SimulatedPaymentGate::new(settings.payment_decline_rate())),
        sleeper: Arc::new(TokioSleeper),
        processing_delay: settings.processing_delay(),
    });
    Ok(CartState::new(cart, checkout))
}

/// Cart application with sessions, tracing, and health checks.
pub fn cart_app(
    state: web::Data<CartState>,
    health_state: web::Data<HealthState>,
    session: &SessionSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(state)
        .app_data(json_config())
        .app_data(form_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(session_middleware(session))
        .wrap(Trace)
        .configure(cart::configure)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app =
        app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", CartApiDoc::openapi()));

    app
}

/// Bind the cart service. `session` should name
/// [`CART_SESSION_COOKIE`](super::CART_SESSION_COOKIE).
///
/// # Errors
/// Returns [`StartupError`] when state cannot be built or the socket cannot
/// be bound.
pub async fn cart_server(
    settings: &CartSettings,
    session: SessionSettings,
) -> Result<Server, StartupError> {
    let state = web::Data::new(build_cart_state(settings).await?);
    let health_state = web::Data::new(HealthState::new(CART_SERVICE));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        cart_app(state.clone(), server_health_state.clone(), &session)
    })
    .bind(settings.bind_addr())?
    .run();

    health_state.mark_ready();
    info!(addr = settings.bind_addr(), "cart service listening");
    Ok(server)
}
