//! Catalogue service assembly.

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use super::{CatalogSettings, StartupError, connect_store, session_middleware};
use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::CatalogApiDoc;
use crate::domain::ports::AlbumRepository;
use crate::domain::{CatalogPorts, CatalogService, RetryPolicy};
use crate::inbound::http::catalog;
use crate::inbound::http::error::{form_config, json_config, path_config, query_config};
use crate::inbound::http::health::{HealthState, health, live, ready};
use crate::inbound::http::session_config::SessionSettings;
use crate::inbound::http::state::CatalogState;
use crate::outbound::http::{HttpAuthClient, HttpCartClient, ServiceEndpoint};
use crate::outbound::memory::InMemoryAlbumRepository;
use crate::outbound::persistence::{DieselAlbumRepository, MigrationSet};
use crate::outbound::storage::LocalCoverStore;

/// Name reported by `/health`.
pub const CATALOG_SERVICE: &str = "catalog-service";

/// Build catalogue state from settings.
///
/// Token checks are retried on transient failures; add-to-cart forwarding
/// is not, because adding twice would double the quantity.
///
/// # Errors
/// Returns [`StartupError`] when the store, upload directory, or clients
/// cannot be prepared.
pub async fn build_catalog_state(settings: &CatalogSettings) -> Result<CatalogState, StartupError> {
    let albums: Arc<dyn AlbumRepository> = match connect_store(
        CATALOG_SERVICE,
        settings.database_url.as_deref(),
        settings.db_max_connections(),
        MigrationSet::Catalog,
    )
    .await?
    {
        Some(pool) => Arc::new(DieselAlbumRepository::new(pool)),
        None => Arc::new(InMemoryAlbumRepository::new()),
    };
    let covers = LocalCoverStore::open(&settings.uploads_dir())?;
    let timeout = settings.http_timeout();
    let auth = HttpAuthClient::new(
        ServiceEndpoint::new(settings.users_service_url(), timeout)?
            .with_retry(RetryPolicy::default()),
    );
    let cart = HttpCartClient::new(ServiceEndpoint::new(settings.cart_service_url(), timeout)?);

    let catalog = CatalogService::new(CatalogPorts {
        albums,
        covers: Arc::new(covers),
        auth: Arc::new(auth),
        cart: Arc::new(cart),
    });
    Ok(CatalogState::new(catalog, settings.cart_public_url()))
}

/// Catalogue application with sessions, tracing, and health checks.
pub fn catalog_app(
    state: web::Data<CatalogState>,
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
        .configure(catalog::configure)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(
        SwaggerUi::new("/docs").url("/api-docs/openapi.json", CatalogApiDoc::openapi()),
    );

    app
}

/// Bind the catalogue service. `session` should name
/// [`CATALOG_SESSION_COOKIE`](super::CATALOG_SESSION_COOKIE).
///
/// # Errors
/// Returns [`StartupError`] when state cannot be built or the socket cannot
/// be bound.
pub async fn catalog_server(
    settings: &CatalogSettings,
    session: SessionSettings,
) -> Result<Server, StartupError> {
    let state = web::Data::new(build_catalog_state(settings).await?);
    let health_state = web::Data::new(HealthState::new(CATALOG_SERVICE));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        catalog_app(state.clone(), server_health_state.clone(), &session)
    })
    .bind(settings.bind_addr())?
    .run();

    health_state.mark_ready();
    info!(addr = settings.bind_addr(), "catalog service listening");
    Ok(server)
}
