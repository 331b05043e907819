//! HTTP and WebSocket shell.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → GET /, GET|POST /health   → handlers.rs → StatusAggregator
//!     → GET /ws                   → websocket.rs → ClientRegistry
//!     → POST {api_prefix}/demo/demo → auth.rs → handlers.rs → DemoService
//! ```

pub mod auth;
pub mod handlers;
pub mod server;
pub mod websocket;

pub use server::{build_router, AppState, HttpServer};
