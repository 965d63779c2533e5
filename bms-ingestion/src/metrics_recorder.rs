use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Calling this again is a no-op.
pub fn init() -> anyhow::Result<()> {
    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))?;

    // Ignore error if the handle was already set; this should only be called once.
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Prometheus exposition text, or `None` if [`init`] was never called.
pub fn render() -> Option<String> {
    PROM_HANDLE.get().map(PrometheusHandle::render)
}
