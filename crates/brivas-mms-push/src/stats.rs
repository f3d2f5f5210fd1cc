//! Receiver statistics

use crate::action::Action;
use brivas_telemetry::{record_dispatch_outcome, record_push_received, Counter, Gauge, Histogram};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counters for every push the receiver sees
pub struct PushStats {
    accepted: Counter,
    ignored: Counter,
    timeouts: Counter,
    side_effect_failures: Counter,
    in_flight: Gauge,
    latency: Histogram,
    outcomes: DashMap<&'static str, u64>,
}

/// Lowers the in-flight gauge on drop, including when the task is aborted
pub struct InFlightGuard<'a> {
    gauge: &'a Gauge,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Point-in-time copy of [`PushStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub ignored: u64,
    pub timeouts: u64,
    pub side_effect_failures: u64,
    pub in_flight: u64,
    pub outcomes: BTreeMap<&'static str, u64>,
    pub p50_latency_ms: f64,
    pub p99_latency_ms: f64,
}

impl Default for PushStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PushStats {
    pub fn new() -> Self {
        Self {
            accepted: Counter::new("mms_push_accepted_total"),
            ignored: Counter::new("mms_push_ignored_total"),
            timeouts: Counter::new("mms_push_dispatch_timeouts_total"),
            side_effect_failures: Counter::new("mms_push_side_effect_failures_total"),
            in_flight: Gauge::new("mms_push_in_flight"),
            latency: Histogram::new("mms_push_dispatch_ms"),
            outcomes: DashMap::new(),
        }
    }

    pub fn record_accepted(&self, mime_type: &'static str) {
        self.accepted.inc();
        record_push_received(mime_type);
    }

    /// MIME type outside the accepted set
    pub fn record_ignored(&self) {
        self.ignored.inc();
    }

    /// Count a push as in flight until the guard is dropped
    pub fn enter(&self) -> InFlightGuard<'_> {
        self.in_flight.inc();
        InFlightGuard { gauge: &self.in_flight }
    }

    pub fn record_outcome(&self, action: &Action, elapsed: Duration) {
        let outcome = action.outcome();
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        record_dispatch_outcome(outcome);
        self.latency.record(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn record_timeout(&self) {
        self.timeouts.inc();
    }

    pub fn record_side_effect_failure(&self) {
        self.side_effect_failures.inc();
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.outcomes.get(outcome).map(|v| *v).unwrap_or(0)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.get(),
            ignored: self.ignored.get(),
            timeouts: self.timeouts.get(),
            side_effect_failures: self.side_effect_failures.get(),
            in_flight: self.in_flight.get(),
            outcomes: self
                .outcomes
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
            p50_latency_ms: self.latency.percentile(50.0),
            p99_latency_ms: self.latency.percentile(99.0),
        }
    }
}
