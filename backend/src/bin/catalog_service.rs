//! Catalog service entry point.

use std::ffi::OsString;

use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use storefront::inbound::http::session_config::{BuildMode, session_settings_from_env};
use storefront::server::{CATALOG_SESSION_COOKIE, CatalogSettings, catalog_server};
use storefront::telemetry::init_tracing;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = CatalogSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| eyre!("failed to load catalog settings: {err}"))?;
    let session = session_settings_from_env(
        &DefaultEnv::new(),
        BuildMode::from_debug_assertions(),
        CATALOG_SESSION_COOKIE,
    )
    .wrap_err("invalid session settings")?;
    let server = catalog_server(&settings, session)
        .await
        .wrap_err("failed to start catalog service")?;
    server.await.wrap_err("catalog service stopped with an error")
}
