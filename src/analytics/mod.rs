//! Analytics subsystem.
//!
//! # Data Flow
//! ```text
//! Director (classified endpoint, User-Agent)
//!     → emitter.rs EventSink::dispatch (returns immediately)
//!     → tokio::spawn
//!         → event.rs AnalyticsEvent (fresh client id)
//!         → POST collect_url, bounded by timeout + in-flight limit
//!         → log outcome, count in metrics
//! ```
//!
//! # Design Decisions
//! - No tracking id at startup means no emitter at all
//! - Delivery is best effort: no retries, failures only logged
//! - The proxied request never waits on, or learns about, delivery

pub mod emitter;
pub mod event;

pub use emitter::{AnalyticsError, Emitter, EventSink};
pub use event::AnalyticsEvent;
