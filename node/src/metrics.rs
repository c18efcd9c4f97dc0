//! # Prometheus Metrics
//!
//! Tracks operational metrics for the devnet driver. There is no HTTP
//! server in this binary, so metrics are not scraped — [`NodeMetrics::encode`]
//! renders the Prometheus text exposition format on demand, for periodic
//! logging or a final summary when the run completes.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across validator tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of blocks committed across all validators.
    pub blocks_processed_total: IntCounter,
    /// Total number of transactions included in committed blocks.
    pub transactions_processed_total: IntCounter,
    /// Current number of transactions waiting in the mempool.
    pub transactions_in_mempool: IntGauge,
    /// Total number of consensus rounds participated in (including rounds
    /// that failed to reach quorum and fell through to the next round).
    pub consensus_rounds_total: IntCounter,
    /// Current block height (latest committed block).
    pub block_height: IntGauge,
    /// Histogram of per-height commit latency in seconds.
    pub block_commit_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("quorum".into()), None)
            .expect("failed to create prometheus registry");

        let blocks_processed_total = IntCounter::new(
            "blocks_processed_total",
            "Total number of committed blocks processed",
        )
        .expect("metric creation");
        registry
            .register(Box::new(blocks_processed_total.clone()))
            .expect("metric registration");

        let transactions_processed_total = IntCounter::new(
            "transactions_processed_total",
            "Total number of transactions included in committed blocks",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_processed_total.clone()))
            .expect("metric registration");

        let transactions_in_mempool = IntGauge::new(
            "transactions_in_mempool",
            "Current number of pending transactions in the mempool",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_in_mempool.clone()))
            .expect("metric registration");

        let consensus_rounds_total = IntCounter::new(
            "consensus_rounds_total",
            "Total number of consensus rounds run, including rounds that failed to commit",
        )
        .expect("metric creation");
        registry
            .register(Box::new(consensus_rounds_total.clone()))
            .expect("metric registration");

        let block_height = IntGauge::new("block_height", "Height of the latest committed block")
            .expect("metric creation");
        registry
            .register(Box::new(block_height.clone()))
            .expect("metric registration");

        let block_commit_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "block_commit_latency_seconds",
                "Wall-clock time to commit a single height, in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(block_commit_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            blocks_processed_total,
            transactions_processed_total,
            transactions_in_mempool,
            consensus_rounds_total,
            block_height,
            block_commit_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
