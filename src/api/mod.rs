//! Game HTTP API
//!
//! JSON endpoints for the session lifecycle and offline verification.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{init_tracing, ApiServer};
