//! Storefront services: catalogue, cart, order, and users.
//!
//! One library backs the four binaries under `src/bin`. Domain rules live in
//! [`domain`], HTTP handlers in [`inbound`], storage and service clients in
//! [`outbound`], and per-service wiring in [`server`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod telemetry;

pub use domain::TraceId;
pub use middleware::Trace;
