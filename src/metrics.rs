//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Storage Metrics
    pub static ref STORAGE_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("yuyu_storage_operations_total", "Total number of storage facade operations"),
        &["operation", "mode", "outcome"]
    ).expect("metric can be created");
    pub static ref STORAGE_OPERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "yuyu_storage_operation_duration_seconds",
            "Storage facade operation duration in seconds"
        ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation", "mode"]
    ).expect("metric can be created");
    pub static ref IMAGE_UPLOADS_TOTAL: IntCounter = IntCounter::new(
        "yuyu_image_uploads_total",
        "Total number of images uploaded to the cloud blob store"
    ).expect("metric can be created");
    pub static ref BACKUP_IMPORTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("yuyu_backup_imports_total", "Total number of backup imports"),
        &["status"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("yuyu_errors_total", "Total number of errors returned to clients"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(STORAGE_OPERATIONS_TOTAL.clone()))
            .expect("STORAGE_OPERATIONS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORAGE_OPERATION_DURATION_SECONDS.clone()))
            .expect("STORAGE_OPERATION_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(IMAGE_UPLOADS_TOTAL.clone()))
            .expect("IMAGE_UPLOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(BACKUP_IMPORTS_TOTAL.clone()))
            .expect("BACKUP_IMPORTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Record one storage facade operation.
pub fn observe_storage_operation(operation: &str, mode: &str, success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "error" };
    STORAGE_OPERATIONS_TOTAL
        .with_label_values(&[operation, mode, outcome])
        .inc();
    STORAGE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, mode])
        .observe(elapsed.as_secs_f64());
}
