//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → routing::Director (forwarded destination, classification, analytics)
//!     → request.rs (hop-by-hop headers, X-Forwarded-For)
//!     → upstream.rs (send to destination)
//!     → response.rs (relay response, map errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use response::ProxyError;
pub use server::{AppState, HttpServer, ServerError};
pub use upstream::UpstreamClient;
