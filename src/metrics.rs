//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Sync Metrics
    pub static ref SYNC_BATCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("media_tracker_sync_batches_total", "Total number of sync batches processed"),
        &["result"]
    ).expect("metric can be created");
    pub static ref SYNC_ITEMS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("media_tracker_sync_items_total", "Total number of sync batch items by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // Share Metrics
    pub static ref SHARE_TOKENS_ISSUED: IntCounterVec = IntCounterVec::new(
        Opts::new("media_tracker_share_tokens_issued_total", "Total number of share tokens issued"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref SHARE_RESOLUTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("media_tracker_share_resolutions_total", "Total number of share token resolutions"),
        &["outcome"]
    ).expect("metric can be created");

    // Auth Metrics
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("media_tracker_logins_total", "Total number of logins"),
        &["account"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("media_tracker_errors_total", "Total number of error responses"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(SYNC_BATCHES_TOTAL.clone()))
        .expect("SYNC_BATCHES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SYNC_ITEMS_TOTAL.clone()))
        .expect("SYNC_ITEMS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SHARE_TOKENS_ISSUED.clone()))
        .expect("SHARE_TOKENS_ISSUED can be registered");
    REGISTRY
        .register(Box::new(SHARE_RESOLUTIONS_TOTAL.clone()))
        .expect("SHARE_RESOLUTIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LOGINS_TOTAL.clone()))
        .expect("LOGINS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
