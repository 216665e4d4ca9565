//! Debug HTTP server surfaced only in `debug_http` feature builds.
//!
//! A lightweight Axum server exposing health, the current dashboard view,
//! the start/recheck/cancel triggers, and an SSE stream of inspection
//! telemetry.

#[cfg(feature = "debug_http")]
mod routes;
#[cfg(feature = "debug_http")]
mod sse;

#[cfg(feature = "debug_http")]
pub use routes::{build_router, run_http_server, DebugHttpState, HttpServerError};

/// Environment variable overriding the bind address.
pub const ADDR_ENV: &str = "OIL_DEBUG_HTTP_ADDR";
/// Environment variable overriding the access token.
pub const TOKEN_ENV: &str = "OIL_DEBUG_TOKEN";

/// Bind address from the environment, falling back to 127.0.0.1:8787.
pub fn bind_addr_from_env() -> std::net::SocketAddr {
    std::env::var(ADDR_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| std::net::SocketAddr::from(([127, 0, 0, 1], 8787)))
}

/// Access token from the environment, falling back to "oil-debug".
pub fn token_from_env() -> String {
    std::env::var(TOKEN_ENV).unwrap_or_else(|_| "oil-debug".to_string())
}
