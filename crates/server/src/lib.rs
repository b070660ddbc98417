//! HTTP surface of the city portal: axum routes over the `service` crate.

pub mod auth;
pub mod errors;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod state;

pub use routes::{build_router, RouterOptions};
pub use startup::{run, run_until};
pub use state::ServerState;
