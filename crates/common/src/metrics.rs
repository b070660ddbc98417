use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static SLUG_COLLISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "portal_slug_collisions_total",
        "Slug candidates rejected because the slug was already taken",
        &["table"]
    )
    .expect("register slug_collisions_total")
});

pub static SCHEMA_FALLBACKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "portal_schema_fallbacks_total",
        "Queries retried with a reduced column set after a missing column",
        &["table", "column"]
    )
    .expect("register schema_fallbacks_total")
});

pub static VIEW_INCREMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "portal_view_increments_total",
        "Detail page views counted",
        &["kind"]
    )
    .expect("register view_increments_total")
});

pub fn record_slug_collision(table: &str) {
    SLUG_COLLISIONS_TOTAL.with_label_values(&[table]).inc();
}

pub fn record_schema_fallback(table: &str, column: &str) {
    SCHEMA_FALLBACKS_TOTAL.with_label_values(&[table, column]).inc();
}

pub fn record_view(kind: &str) {
    VIEW_INCREMENTS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
