//! Cart service entry point.

use std::ffi::OsString;

use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use storefront::inbound::http::session_config::{BuildMode, session_settings_from_env};
use storefront::server::{CART_SESSION_COOKIE, CartSettings, cart_server};
use storefront::telemetry::init_tracing;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = CartSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| eyre!("failed to load cart settings: {err}"))?;
    let session = session_settings_from_env(
        &DefaultEnv::new(),
        BuildMode::from_debug_assertions(),
        CART_SESSION_COOKIE,
    )
    .wrap_err("invalid session settings")?;
    let server = cart_server(&settings, session)
        .await
        .wrap_err("failed to start cart service")?;
    server.await.wrap_err("cart service stopped with an error")
}
