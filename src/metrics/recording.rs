//! In-memory metrics sink.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::MetricsSink;

type SeriesKey = (String, Vec<(String, String)>);

fn series_key(name: &str, labels: &[(&str, &str)]) -> SeriesKey {
    let mut labels: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    labels.sort();
    (name.to_string(), labels)
}

// == Recording Sink ==
/// Keeps the last value of every gauge and every histogram sample in memory.
///
/// Label order does not matter when reading a series back.
#[derive(Debug, Default)]
pub struct RecordingSink {
    gauges: Mutex<HashMap<SeriesKey, f64>>,
    histograms: Mutex<HashMap<SeriesKey, Vec<f64>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last value set for a gauge series.
    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges.lock().get(&series_key(name, labels)).copied()
    }

    /// Returns all samples recorded for a histogram series.
    pub fn histogram_samples(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.histograms
            .lock()
            .get(&series_key(name, labels))
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of samples recorded under `name`, across all label sets.
    pub fn histogram_count(&self, name: &str) -> usize {
        self.histograms
            .lock()
            .iter()
            .filter(|((series, _), _)| series == name)
            .map(|(_, samples)| samples.len())
            .sum()
    }
}

impl MetricsSink for RecordingSink {
    fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        self.gauges.lock().insert(series_key(name, labels), value);
    }

    fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        self.histograms
            .lock()
            .entry(series_key(name, labels))
            .or_default()
            .push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_keeps_last_value() {
        let sink = RecordingSink::new();
        sink.set_gauge("g", &[("shard_id", "0")], 1.0);
        sink.set_gauge("g", &[("shard_id", "0")], 3.0);
        sink.set_gauge("g", &[("shard_id", "1")], 7.0);

        assert_eq!(sink.gauge("g", &[("shard_id", "0")]), Some(3.0));
        assert_eq!(sink.gauge("g", &[("shard_id", "1")]), Some(7.0));
        assert_eq!(sink.gauge("g", &[]), None);
    }

    #[test]
    fn test_histogram_label_order_ignored() {
        let sink = RecordingSink::new();
        sink.observe_histogram("h", &[("shard_id", "0"), ("method", "get")], 0.5);
        sink.observe_histogram("h", &[("method", "get"), ("shard_id", "0")], 0.25);
        sink.observe_histogram("h", &[("method", "set"), ("shard_id", "0")], 0.1);

        let samples = sink.histogram_samples("h", &[("shard_id", "0"), ("method", "get")]);
        assert_eq!(samples, vec![0.5, 0.25]);
        assert_eq!(sink.histogram_count("h"), 3);
        assert_eq!(sink.histogram_count("other"), 0);
    }
}
