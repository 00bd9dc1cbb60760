//! Network Module
//!
//! HTTP adapter over the engine.
//!
//! ## Routes
//! - `PUT    /v1/{key}` — body is the value, `201 Created`
//! - `GET    /v1/{key}` — `200` with the value, `404` if absent
//! - `DELETE /v1/{key}` — `200`
//!
//! Any other failure maps to `500`.

mod handlers;
mod server;

pub use handlers::router;
pub use server::{shutdown_signal, Server};
