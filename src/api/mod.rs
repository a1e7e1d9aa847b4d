//! API layer
//!
//! HTTP handlers for:
//! - Pages (home, clone, not found)
//! - Metrics (Prometheus)

pub mod metrics;
mod pages;

pub use metrics::metrics_router;
pub(crate) use pages::page_not_found;
pub use pages::pages_router;
