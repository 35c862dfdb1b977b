//! Integration tests: HTTP endpoints via `oneshot` and live WebSocket sessions.

mod health_test;
mod helpers;
mod ws_test;
