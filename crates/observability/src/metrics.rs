//! Prometheus metrics for the tick-ingestion path
//!
//! The bar synthesizer carries a per-tick latency budget, so the metrics
//! here are oriented around the ingest hot path: throughput counters,
//! a processing-latency histogram, and an open-buffer gauge.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Initialize the Prometheus metrics exporter
///
/// Starts an HTTP listener on the specified port exposing metrics at
/// the `/metrics` endpoint.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Metrics for one tick-ingestion pipeline
///
/// # Metrics
///
/// * `ticks_processed_total` - Ticks accepted and folded into buffers
/// * `ticks_rejected_total` - Ticks rejected by validation
/// * `bars_emitted_total` - Completed bars emitted on period rollover
/// * `tick_processing_seconds` - Per-tick processing latency histogram
/// * `open_buffers` - Currently open (symbol, period) buffers
#[derive(Clone)]
pub struct IngestMetrics {
    ticks_processed: Counter,
    ticks_rejected: Counter,
    bars_emitted: Counter,
    tick_latency: Histogram,
    open_buffers: Gauge,
    pipeline: String,
}

impl IngestMetrics {
    /// Create metrics for a named pipeline (e.g., "live", "replay")
    pub fn new(pipeline: &str) -> Self {
        let name = pipeline.to_string();

        Self {
            ticks_processed: counter!("ticks_processed_total", "pipeline" => name.clone()),
            ticks_rejected: counter!("ticks_rejected_total", "pipeline" => name.clone()),
            bars_emitted: counter!("bars_emitted_total", "pipeline" => name.clone()),
            tick_latency: histogram!("tick_processing_seconds", "pipeline" => name.clone()),
            open_buffers: gauge!("open_buffers", "pipeline" => name.clone()),
            pipeline: name,
        }
    }

    /// Record one accepted tick and the bars it completed
    pub fn record_tick(&self, duration: Duration, bars_emitted: usize) {
        self.ticks_processed.increment(1);
        if bars_emitted > 0 {
            self.bars_emitted.increment(bars_emitted as u64);
        }
        self.tick_latency.record(duration.as_secs_f64());
    }

    /// Record one tick rejected by validation
    pub fn record_rejected(&self) {
        self.ticks_rejected.increment(1);
    }

    /// Update the open-buffer gauge
    pub fn set_open_buffers(&self, count: usize) {
        self.open_buffers.set(count as f64);
    }

    /// Get the pipeline name
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }
}
