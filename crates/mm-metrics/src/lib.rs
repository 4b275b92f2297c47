use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

static EXPORTER_STARTED: AtomicBool = AtomicBool::new(false);

fn resolve_port(raw: Option<&str>, default_port: u16) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(default_port)
}

/// Start a Prometheus scrape endpoint on `0.0.0.0:<port>`.
///
/// The port comes from `port_env` or `default_port`. Must be called from
/// inside a tokio runtime. Returns whether an exporter is running; repeated
/// calls are no-ops.
pub fn init_metrics(port_env: &str, default_port: u16) -> bool {
    if EXPORTER_STARTED.load(Ordering::SeqCst) {
        return true;
    }

    let port = resolve_port(env::var(port_env).ok().as_deref(), default_port);

    match PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
    {
        Ok(()) => {
            EXPORTER_STARTED.store(true, Ordering::SeqCst);
            info!(metrics_port = port, "started prometheus exporter");
            true
        }
        Err(err) => {
            warn!(error = %err, metrics_port = port, "failed to start prometheus exporter");
            false
        }
    }
}
