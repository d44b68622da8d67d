//! Request middleware shared by every storefront service.
//!
//! [`Trace`] assigns each request a trace id, echoes it in the
//! `trace-id` response header, and scopes it for outbound service calls.

pub mod trace;

pub use trace::Trace;
