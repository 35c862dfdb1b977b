//! # aiengines-api
//!
//! HTTP layer for the AI Engines real-time hub built on Axum.
//!
//! Provides the authenticated WebSocket upgrade, health endpoints,
//! middleware (CORS, request logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
