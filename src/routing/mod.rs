//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (forwarding header, Accept, User-Agent)
//!     → forwarded.rs (parse destination URL)
//!     → director.rs (rewrite URI + Host)
//!     → resource.rs (Accept + path → canonical endpoint)
//!     → analytics sink (fire-and-forget)
//!     → Return: upstream target
//! ```
//!
//! # Design Decisions
//! - Destination comes only from the trusted forwarding header
//! - Deterministic: same input always classifies the same way
//! - First match wins (ordered negotiation rules)
//! - Classification failures never block proxying

pub mod director;
pub mod forwarded;
pub mod resource;

pub use director::Director;
pub use forwarded::ForwardedUrlError;
pub use resource::{classify, ClassifiedEndpoint, ResourceType, UnsupportedResourceType};
