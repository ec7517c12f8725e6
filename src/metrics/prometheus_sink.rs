//! Prometheus-backed metrics sink.

use std::collections::HashMap;

use parking_lot::RwLock;
use prometheus::{Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use tracing::{debug, warn};

use super::{
    MetricsSink, LABEL_METHOD, LABEL_SHARD_ID, LRU_TOTAL_BYTES, LRU_USED_BYTES, TTL_EXPIRED,
    TTL_TOTAL, TTL_USAGE_SECONDS,
};
use crate::error::{CacheError, Result};

/// Latency buckets in seconds.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.001, 0.0015, 0.002, 0.003, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.5,
    3.0, 3.5, 5.0, 7.5, 10.0,
];

#[derive(Debug)]
struct Series<T> {
    vec: T,
    label_names: Vec<String>,
}

impl<T> Series<T> {
    /// Orders label values by the names the series was registered with.
    fn values<'a>(&self, labels: &[(&str, &'a str)]) -> Option<Vec<&'a str>> {
        self.label_names
            .iter()
            .map(|name| {
                labels
                    .iter()
                    .find(|(k, _)| *k == name.as_str())
                    .map(|(_, v)| *v)
            })
            .collect()
    }
}

fn help_for(name: &str) -> &str {
    match name {
        LRU_USED_BYTES => "Bytes currently held by the LRU cache",
        LRU_TOTAL_BYTES => "Byte budget of the LRU cache",
        TTL_TOTAL => "Entries scanned by the last sweep of a TTL shard",
        TTL_EXPIRED => "Expired entries removed by the last sweep of a TTL shard",
        TTL_USAGE_SECONDS => "Latency of TTL shard operations",
        other => other,
    }
}

// == Prometheus Sink ==
/// Forwards observations to gauge and histogram vectors in a registry.
///
/// The cache metrics are registered up front, so steady-state observations
/// only take the shared side of the series lock and shards never wait on
/// each other here. Unknown metric names are registered on first use; the
/// label names seen then fix the schema, and later observations missing
/// one of those labels are dropped.
#[derive(Debug)]
pub struct PrometheusSink {
    registry: Registry,
    gauges: RwLock<HashMap<String, Series<GaugeVec>>>,
    histograms: RwLock<HashMap<String, Series<HistogramVec>>>,
}

impl PrometheusSink {
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Self {
        let sink = Self {
            registry,
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
        };
        sink.register_cache_metrics();
        sink
    }

    fn register_cache_metrics(&self) {
        let mut gauges = self.gauges.write();
        for (name, labels) in [
            (LRU_USED_BYTES, &[][..]),
            (LRU_TOTAL_BYTES, &[][..]),
            (TTL_TOTAL, &[LABEL_SHARD_ID][..]),
            (TTL_EXPIRED, &[LABEL_SHARD_ID][..]),
        ] {
            if let Some(series) = self.register_gauge(name, labels) {
                gauges.insert(name.to_string(), series);
            }
        }

        if let Some(series) =
            self.register_histogram(TTL_USAGE_SECONDS, &[LABEL_SHARD_ID, LABEL_METHOD])
        {
            self.histograms
                .write()
                .insert(TTL_USAGE_SECONDS.to_string(), series);
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // == Render ==
    /// Encodes everything gathered from the registry in the text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| CacheError::Internal(format!("metrics encoding failed: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| CacheError::Internal(format!("metrics are not valid UTF-8: {}", e)))
    }

    fn register_gauge(&self, name: &str, label_names: &[&str]) -> Option<Series<GaugeVec>> {
        let vec = GaugeVec::new(Opts::new(name, help_for(name)), label_names)
            .map_err(|e| warn!("Failed to create gauge {}: {}", name, e))
            .ok()?;
        self.registry
            .register(Box::new(vec.clone()))
            .map_err(|e| warn!("Failed to register gauge {}: {}", name, e))
            .ok()?;
        debug!("Registered gauge {} with labels {:?}", name, label_names);
        Some(Series {
            vec,
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn register_histogram(
        &self,
        name: &str,
        label_names: &[&str],
    ) -> Option<Series<HistogramVec>> {
        let opts = HistogramOpts::new(name, help_for(name)).buckets(DEFAULT_BUCKETS.to_vec());
        let vec = HistogramVec::new(opts, label_names)
            .map_err(|e| warn!("Failed to create histogram {}: {}", name, e))
            .ok()?;
        self.registry
            .register(Box::new(vec.clone()))
            .map_err(|e| warn!("Failed to register histogram {}: {}", name, e))
            .ok()?;
        debug!("Registered histogram {} with labels {:?}", name, label_names);
        Some(Series {
            vec,
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `apply` on the series for `name`, registering it first if needed.
///
/// Known series are served under the read lock; the write lock is only
/// taken to register a new name.
fn with_series<T>(
    map: &RwLock<HashMap<String, Series<T>>>,
    name: &str,
    labels: &[(&str, &str)],
    register: impl FnOnce(&[&str]) -> Option<Series<T>>,
    apply: impl FnOnce(&Series<T>),
) {
    {
        let series = map.read();
        if let Some(found) = series.get(name) {
            apply(found);
            return;
        }
    }

    let mut series = map.write();
    if !series.contains_key(name) {
        let names: Vec<&str> = labels.iter().map(|(k, _)| *k).collect();
        match register(&names) {
            Some(registered) => {
                series.insert(name.to_string(), registered);
            }
            None => return,
        }
    }
    if let Some(found) = series.get(name) {
        apply(found);
    }
}

impl MetricsSink for PrometheusSink {
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        with_series(
            &self.gauges,
            name,
            labels,
            |names| self.register_gauge(name, names),
            |series| {
                let Some(values) = series.values(labels) else {
                    warn!("Gauge {} observed without its registered labels", name);
                    return;
                };
                match series.vec.get_metric_with_label_values(values.as_slice()) {
                    Ok(gauge) => gauge.set(value),
                    Err(e) => warn!("Gauge {} rejected labels: {}", name, e),
                }
            },
        );
    }

    fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        with_series(
            &self.histograms,
            name,
            labels,
            |names| self.register_histogram(name, names),
            |series| {
                let Some(values) = series.values(labels) else {
                    warn!("Histogram {} observed without its registered labels", name);
                    return;
                };
                match series.vec.get_metric_with_label_values(values.as_slice()) {
                    Ok(histogram) => histogram.observe(value),
                    Err(e) => warn!("Histogram {} rejected labels: {}", name, e),
                }
            },
        );
    }
}
