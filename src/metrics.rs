//! Counters for ingestion runs and catalog downloads.
//!
//! Without an installed recorder the `metrics` macros are no-ops, so tests and
//! the `ingest` command pay nothing for them.

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static DESCRIBE: Once = Once::new();

pub struct IngestMetrics;

impl IngestMetrics {
    /// One adapter finished and produced `mods` entries
    pub fn record_source_batch(source: &'static str, mods: usize) {
        ::metrics::counter!("modvoyage_source_fetches_total", "source" => source).increment(1);
        ::metrics::counter!("modvoyage_source_mods_total", "source" => source)
            .increment(mods as u64);
    }

    /// An adapter task panicked or was cancelled
    pub fn record_source_failure() {
        ::metrics::counter!("modvoyage_source_failures_total").increment(1);
    }

    pub fn record_saved(entity: &'static str, saved: usize) {
        ::metrics::counter!("modvoyage_ingest_saved_total", "entity" => entity)
            .increment(saved as u64);
    }

    pub fn record_item_error(entity: &'static str) {
        ::metrics::counter!("modvoyage_ingest_errors_total", "entity" => entity).increment(1);
    }
}

pub struct CatalogMetrics;

impl CatalogMetrics {
    pub fn record_download() {
        ::metrics::counter!("modvoyage_downloads_total").increment(1);
    }
}

fn describe() {
    DESCRIBE.call_once(|| {
        ::metrics::describe_counter!(
            "modvoyage_source_fetches_total",
            "Completed adapter fetches by source"
        );
        ::metrics::describe_counter!(
            "modvoyage_source_mods_total",
            "Mods returned by adapters, including fallback data"
        );
        ::metrics::describe_counter!(
            "modvoyage_source_failures_total",
            "Adapter tasks that did not complete"
        );
        ::metrics::describe_counter!(
            "modvoyage_ingest_saved_total",
            "Rows written by the ingestion writer"
        );
        ::metrics::describe_counter!(
            "modvoyage_ingest_errors_total",
            "Rows the ingestion writer failed to write"
        );
        ::metrics::describe_counter!("modvoyage_downloads_total", "Recorded mod downloads");
    });
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
/// A second install (or a busy port) is logged and ignored.
pub fn init_metrics(addr: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            describe();
            info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}
