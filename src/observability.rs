use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking requests handled at the transport boundary.
/// Labels: op, status.
pub const REQUESTS_TOTAL: &str = "bookd_requests_total";

/// Counter: bookings created (single and batch paths).
pub const BOOKINGS_CREATED_TOTAL: &str = "bookd_bookings_created_total";

/// Counter: requests rejected because the window overlapped an existing
/// booking in the room.
pub const BOOKING_CONFLICTS_TOTAL: &str = "bookd_booking_conflicts_total";

/// Counter: batch items rejected (any reason).
pub const BATCH_ITEMS_REJECTED_TOTAL: &str = "bookd_batch_items_rejected_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
