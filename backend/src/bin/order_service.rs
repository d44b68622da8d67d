//! Order service entry point.

use std::ffi::OsString;

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use storefront::server::{OrderSettings, order_server};
use storefront::telemetry::init_tracing;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = OrderSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| eyre!("failed to load order settings: {err}"))?;
    let server = order_server(&settings)
        .await
        .wrap_err("failed to start order service")?;
    server.await.wrap_err("order service stopped with an error")
}
