//! Prometheus metrics.
//!
//! Counters are recorded through the `metrics` facade everywhere in the
//! crate. Nothing is exported unless `[metrics] enabled = true`, in which
//! case a Prometheus scrape endpoint is served on `0.0.0.0:<port>`.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether the exporter is installed.
    pub enabled: bool,
    /// Address the scrape endpoint binds to.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds the exporter configuration from settings.
    #[must_use]
    pub const fn from_settings(settings: &MetricsSettings) -> Self {
        Self {
            enabled: settings.enabled,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), settings.port),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Returns `false` without touching the global recorder when metrics are
/// disabled. Outside a Tokio runtime the exporter runs its listener on a
/// background thread of its own.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot be started.
pub fn install_prometheus(config: &MetricsConfig) -> Result<bool> {
    if !config.enabled {
        return Ok(false);
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| Error::operation("metrics_exporter_install", e))?;

    tracing::info!(addr = %config.listen_addr, "Prometheus metrics exporter listening");
    Ok(true)
}
