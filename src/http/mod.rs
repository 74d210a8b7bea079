//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, hot-swappable pipeline)
//!     → request.rs (request ID, tracing span)
//!     → handlers.rs (/a, /api/frames, /health)
//!     → [proxy pipeline]
//!     → response.rs (ProxyReply → status, headers, body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
