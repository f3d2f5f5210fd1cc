//! Metrics primitives
//!
//! Each primitive keeps a local value for in-process inspection and mirrors
//! every update into the `metrics` facade under the same name.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter
#[derive(Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: &'static str,
}

impl Counter {
    pub fn new(name: &'static str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name,
        }
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
        ::metrics::counter!(self.name).increment(n);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Up/down gauge
#[derive(Clone)]
pub struct Gauge {
    value: Arc<AtomicU64>,
    name: &'static str,
}

impl Gauge {
    pub fn new(name: &'static str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name,
        }
    }

    pub fn set(&self, val: u64) {
        self.value.store(val, Ordering::Relaxed);
        self.publish(val);
    }

    pub fn inc(&self) {
        let val = self.value.fetch_add(1, Ordering::Relaxed) + 1;
        self.publish(val);
    }

    /// Saturates at zero
    pub fn dec(&self) {
        let previous = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)))
            .unwrap_or_default();
        self.publish(previous.saturating_sub(1));
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn publish(&self, val: u64) {
        ::metrics::gauge!(self.name).set(val as f64);
    }
}

/// Sliding-window histogram (keeps the most recent samples)
#[derive(Clone)]
pub struct Histogram {
    samples: Arc<Mutex<VecDeque<f64>>>,
    name: &'static str,
    max_samples: usize,
}

impl Histogram {
    pub fn new(name: &'static str) -> Self {
        Self::with_capacity(name, 10_000)
    }

    pub fn with_capacity(name: &'static str, max_samples: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(max_samples.min(1024)))),
            name,
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&self, value: f64) {
        {
            let mut samples = self.samples.lock();
            if samples.len() >= self.max_samples {
                samples.pop_front();
            }
            samples.push_back(value);
        }
        ::metrics::histogram!(self.name).record(value);
    }

    pub fn percentile(&self, p: f64) -> f64 {
        let mut sorted: Vec<f64> = self.samples.lock().iter().copied().collect();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_by(f64::total_cmp);
        let idx = ((sorted.len() as f64) * p / 100.0) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn mean(&self) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn count(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Count an accepted push by MIME type
pub fn record_push_received(mime_type: &'static str) {
    ::metrics::counter!("mms_push_received_total", "mime_type" => mime_type).increment(1);
}

/// Count a dispatch result by outcome label
pub fn record_dispatch_outcome(outcome: &'static str) {
    ::metrics::counter!("mms_push_dispatch_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter");
        assert_eq!(counter.get(), 0);
        counter.inc();
        assert_eq!(counter.get(), 1);
        counter.add(5);
        assert_eq!(counter.get(), 6);
    }

    #[test]
    fn test_gauge_saturates() {
        let gauge = Gauge::new("test_gauge");
        gauge.inc();
        gauge.dec();
        gauge.dec();
        assert_eq!(gauge.get(), 0);
        gauge.set(10);
        assert_eq!(gauge.get(), 10);
    }

    #[test]
    fn test_histogram_window() {
        let hist = Histogram::with_capacity("test_histogram", 3);
        for v in [100.0, 1.0, 2.0, 3.0] {
            hist.record(v);
        }
        assert_eq!(hist.count(), 3);
        assert!((hist.mean() - 2.0).abs() < 0.001);
        assert!((hist.percentile(50.0) - 2.0).abs() < 0.001);
    }
}
