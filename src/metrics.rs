//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Forge Metrics
    pub static ref FORGE_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("forgelink_forge_requests_total", "Total number of requests sent to the code forge"),
        &["operation", "status"]
    ).expect("metric can be created");

    // Session Metrics
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("forgelink_logins_total", "Total number of login attempts"),
        &["outcome"]
    ).expect("metric can be created");

    // Clone Metrics
    pub static ref CLONES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("forgelink_clones_total", "Total number of repository clone attempts"),
        &["outcome"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("forgelink_errors_total", "Total number of errors returned to clients"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; integration tests build several servers
/// in one process.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(FORGE_REQUESTS_TOTAL.clone()))
            .expect("FORGE_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(LOGINS_TOTAL.clone()))
            .expect("LOGINS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(CLONES_TOTAL.clone()))
            .expect("CLONES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
