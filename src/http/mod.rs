//! HTTP surface: health and WebSocket upgrade

pub mod routes;

pub use routes::build_router;
