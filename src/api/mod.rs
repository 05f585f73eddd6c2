//! HTTP prediction API.
//!
//! `POST /predict` prices a list of car option sets; `GET /`, `GET /health`
//! and `GET /metrics` describe and monitor the service.

mod handlers;
mod server;

pub use handlers::ServiceInfo;
pub use server::{router, run_server, ApiState};
