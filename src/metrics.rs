use once_cell::sync::Lazy;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, TextEncoder, register_int_counter,
    register_int_counter_vec, register_int_gauge,
};

pub static TRADES_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ea_bridge_trades_submitted_total",
        "Trade commands accepted into the queue"
    )
    .expect("trades_submitted counter")
});

pub static COMMANDS_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ea_bridge_commands_delivered_total",
        "Trade commands handed to a polling EA"
    )
    .expect("commands_delivered counter")
});

pub static EMPTY_POLLS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ea_bridge_empty_polls_total",
        "Authenticated EA polls that found nothing pending"
    )
    .expect("empty_polls counter")
});

/// Labelled by `kind`: `operator_missing`, `operator_invalid`, `ea_signature`.
pub static AUTH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "ea_bridge_auth_failures_total",
        "Rejected requests by authentication kind",
        &["kind"]
    )
    .expect("auth_failures counter")
});

pub static QUEUE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ea_bridge_queue_failures_total",
        "Queue operations that failed because the store was disabled or unreachable"
    )
    .expect("queue_failures counter")
});

pub static UPSTREAM_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ea_bridge_upstream_failures_total",
        "Market data requests that failed upstream"
    )
    .expect("upstream_failures counter")
});

pub static QUEUE_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "ea_bridge_queue_pending",
        "Pending commands as of the last queue read"
    )
    .expect("queue_pending gauge")
});

/// Prometheus text exposition of the default registry.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_registered_metrics() {
        TRADES_SUBMITTED.inc();
        AUTH_FAILURES.with_label_values(&["ea_signature"]).inc();

        let text = render().unwrap();
        assert!(text.contains("ea_bridge_trades_submitted_total"));
        assert!(text.contains("kind=\"ea_signature\""));
    }
}
