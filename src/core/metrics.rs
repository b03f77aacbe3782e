use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!("grading_jobs_total", "Grading worker outcomes by status");
    metrics::describe_histogram!("grading_duration_seconds", "Inference round-trip per answer");
    metrics::describe_counter!(
        "grading_guard_miss_total",
        "Conditional progress updates that matched no row"
    );
    metrics::describe_counter!("grading_dispatch_spawned_total", "Workers spawned by dispatch or regrade");
    metrics::describe_counter!("grading_cancellations_total", "Cancel requests applied");
    metrics::describe_counter!("grading_regrades_total", "Regrade requests accepted");
    metrics::describe_counter!(
        "grading_events_publish_failed_total",
        "Grading events the broadcaster rejected"
    );
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
