//! Users service assembly.

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use super::{StartupError, UsersSettings, connect_store};
use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::UsersApiDoc;
use crate::domain::AuthService;
use crate::domain::ports::{SessionTokenRepository, UserRepository};
use crate::inbound::http::error::{json_config, path_config, query_config};
use crate::inbound::http::health::{HealthState, health, live, ready};
use crate::inbound::http::state::UsersState;
use crate::inbound::http::users;
use crate::outbound::memory::{InMemorySessionTokenRepository, InMemoryUserRepository};
use crate::outbound::persistence::{
    DieselSessionTokenRepository, DieselUserRepository, MigrationSet,
};

/// Name reported by `/health`.
pub const USERS_SERVICE: &str = "users-service";

/// Build users state, ensure the `admin` account exists, and drop tokens
/// that expired while the service was down.
///
/// # Errors
/// Returns [`StartupError`] when the store cannot be prepared or the
/// bootstrap writes fail.
pub async fn build_users_state(settings: &UsersSettings) -> Result<UsersState, StartupError> {
    let (accounts, tokens): (Arc<dyn UserRepository>, Arc<dyn SessionTokenRepository>) =
        match connect_store(
            USERS_SERVICE,
            settings.database_url.as_deref(),
            settings.db_max_connections(),
            MigrationSet::Users,
        )
        .await?
        {
            Some(pool) => (
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselSessionTokenRepository::new(pool)),
            ),
            None => (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemorySessionTokenRepository::new()),
            ),
        };
    let auth = AuthService::new(accounts, tokens, Arc::new(DefaultClock), settings.token_ttl());

    auth.bootstrap_admin(settings.admin_password()).await?;
    let purged = auth.purge_expired().await?;
    info!(purged, "expired session tokens removed");
    Ok(UsersState::new(auth))
}

/// Users application with tracing and health checks.
pub fn users_app(
    state: web::Data<UsersState>,
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
        .configure(users::configure)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app =
        app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", UsersApiDoc::openapi()));

    app
}

/// Bind the users service.
///
/// # Errors
/// Returns [`StartupError`] when state cannot be built or the socket cannot
/// be bound.
pub async fn users_server(settings: &UsersSettings) -> Result<Server, StartupError> {
    let state = web::Data::new(build_users_state(settings).await?);
    let health_state = web::Data::new(HealthState::new(USERS_SERVICE));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || users_app(state.clone(), server_health_state.clone()))
        .bind(settings.bind_addr())?
        .run();

    health_state.mark_ready();
    info!(addr = settings.bind_addr(), "users service listening");
    Ok(server)
}
