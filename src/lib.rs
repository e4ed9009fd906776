//! Analytics route service library.
//!
//! A route-service reverse proxy: each request names its real destination in
//! a forwarding header, is forwarded there unchanged, and is reported to an
//! analytics collector as a canonical, type-suffixed resource URL.

pub mod analytics;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
