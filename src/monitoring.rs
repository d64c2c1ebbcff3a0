// Copyright 2025 Cowboy AI, LLC.

//! Monitoring: latency/rate metrics with percentile computation, business
//! counters, component health tracking, and threshold-triggered alerting.

use crate::config::MonitoringConfig;
use crate::holon::HolonType;
use crate::ids::{AlertHandlerId, AlertId};
use crate::relationship::RelationshipType;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::warn;

/// The closed set of alert kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    /// Event or constraint validation is failing at an elevated rate.
    ValidationFailure,
    /// Latency on an ingestion or query path has crossed its threshold.
    PerformanceDegradation,
    /// A component reported unhealthy, or a query/ingestion path is
    /// erroring at an elevated rate.
    SystemError,
    /// A business-level rule (e.g. constraint violations) crossed its
    /// threshold.
    BusinessRule,
}

/// How urgently an alert demands attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Informational; no action required.
    Info,
    /// Degraded but not failing.
    Warning,
    /// Requires immediate attention.
    Critical,
}

/// A single alert raised when a metric crosses its threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier.
    pub id: AlertId,
    /// The kind of condition that triggered this alert.
    pub alert_type: AlertType,
    /// Urgency.
    pub severity: AlertSeverity,
    /// The metric that triggered this alert.
    pub metric: String,
    /// The observed value.
    pub value: f64,
    /// The threshold that was crossed.
    pub threshold: f64,
    /// Optional human-readable context.
    pub message: Option<String>,
    /// When the alert was raised.
    pub raised_at: DateTime<Utc>,
    /// `true` once acknowledged via [`Monitoring::resolve_alert`].
    pub resolved: bool,
}

/// Callback invoked whenever an alert is raised.
pub trait AlertHandler: Send + Sync {
    /// Handle a newly raised alert.
    fn handle(&self, alert: &Alert);
}

/// A handler that logs via `tracing` at `warn` level. This is the
/// handler every [`Monitoring`] instance starts with.
pub struct TracingAlertHandler;

impl AlertHandler for TracingAlertHandler {
    fn handle(&self, alert: &Alert) {
        warn!(
            alert_type = ?alert.alert_type,
            severity = ?alert.severity,
            metric = %alert.metric,
            value = alert.value,
            threshold = alert.threshold,
            "metric threshold exceeded"
        );
    }
}

struct MetricSeries {
    samples: VecDeque<(DateTime<Utc>, f64)>,
    threshold: Option<f64>,
}

impl MetricSeries {
    fn empty() -> Self {
        Self {
            samples: VecDeque::new(),
            threshold: None,
        }
    }

    fn evict_older_than(&mut self, now: DateTime<Utc>, retention: Duration) {
        while let Some(&(ts, _)) = self.samples.front() {
            if now - ts > retention {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|(_, v)| *v).collect()
    }
}

/// Percentile summary of a metric's retained samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Percentiles {
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
}

fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((sorted.len() - 1) as f64 * fraction).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Health of a single monitored component (e.g. the event store, a
/// registry, an external integration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentHealthStatus {
    /// Operating normally.
    Healthy,
    /// Operating with reduced capability or elevated latency.
    Degraded,
    /// Not operating.
    Unhealthy,
}

/// The last reported health of a single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name.
    pub name: String,
    /// Current status.
    pub status: ComponentHealthStatus,
    /// Last reported latency, if any.
    pub latency_ms: Option<f64>,
    /// Last reported context message.
    pub message: Option<String>,
    /// Consecutive non-healthy reports; reset to zero on recovery.
    pub error_count: u64,
    /// When this status was last reported.
    pub updated_at: DateTime<Utc>,
}

/// Aggregate system health: the worst of its components' statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// `Unhealthy` if any component is unhealthy, else `Degraded` if any
    /// component is degraded, else `Healthy`.
    pub overall: ComponentHealthStatus,
    /// Every component's last reported health.
    pub components: Vec<ComponentHealth>,
}

/// Summary of event-ingestion throughput and latency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventMetrics {
    /// Total events ingested since the last reset.
    pub total_ingested: u64,
    /// Of those, the number that failed.
    pub total_failed: u64,
    /// `total_ingested.saturating_sub(total_failed) / total_ingested`.
    pub success_rate: f64,
    /// Mean ingestion latency over retained samples.
    pub avg_latency_ms: f64,
    /// 95th percentile ingestion latency over retained samples.
    pub p95_latency_ms: f64,
    /// 99th percentile ingestion latency over retained samples.
    pub p99_latency_ms: f64,
}

/// Summary of query throughput, latency, and cache effectiveness for a
/// single query type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Total queries of this type since the last reset.
    pub total: u64,
    /// Of those, the number that failed.
    pub failed: u64,
    /// Fraction of queries served from cache.
    pub cache_hit_rate: f64,
    /// Mean query latency over retained samples.
    pub avg_latency_ms: f64,
    /// 95th percentile query latency over retained samples.
    pub p95_latency_ms: f64,
}

/// Domain-level counters: creation/lifecycle activity and rule
/// violations, broken down by type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessMetrics {
    /// Holons created, by type, since the last reset.
    pub holons_created_by_type: HashMap<HolonType, u64>,
    /// Holons currently recorded as active, by type.
    pub active_holons_by_type: HashMap<HolonType, u64>,
    /// Relationships created, by type, since the last reset.
    pub relationships_created_by_type: HashMap<RelationshipType, u64>,
    /// Relationships ended, by type, since the last reset.
    pub relationships_ended_by_type: HashMap<RelationshipType, u64>,
    /// Constraint violations, by constraint name, since the last reset.
    pub constraint_violations_by_type: HashMap<String, u64>,
}

#[derive(Default)]
struct EventCounters {
    ingested: u64,
    failed: u64,
}

#[derive(Default)]
struct QueryCounters {
    total: u64,
    failed: u64,
    cache_hits: u64,
}

/// Collects metric samples and raises alerts when a registered threshold
/// is crossed.
pub struct Monitoring {
    config: MonitoringConfig,
    series: RwLock<HashMap<String, MetricSeries>>,
    handlers: RwLock<Vec<(AlertHandlerId, Box<dyn AlertHandler>)>>,
    alerts: RwLock<Vec<Alert>>,
    event_counters: RwLock<EventCounters>,
    query_counters: RwLock<HashMap<String, QueryCounters>>,
    business: RwLock<BusinessMetrics>,
    components: RwLock<HashMap<String, ComponentHealth>>,
}

impl Monitoring {
    /// Construct a monitoring instance with a `TracingAlertHandler`
    /// registered by default.
    pub fn new(config: MonitoringConfig) -> Self {
        let monitoring = Self {
            config,
            series: RwLock::new(HashMap::new()),
            handlers: RwLock::new(Vec::new()),
            alerts: RwLock::new(Vec::new()),
            event_counters: RwLock::new(EventCounters::default()),
            query_counters: RwLock::new(HashMap::new()),
            business: RwLock::new(BusinessMetrics::default()),
            components: RwLock::new(HashMap::new()),
        };
        monitoring.register_alert_handler(Box::new(TracingAlertHandler));
        monitoring
    }

    /// Register a handler invoked on every newly raised alert.
    pub fn register_alert_handler(&self, handler: Box<dyn AlertHandler>) -> AlertHandlerId {
        let id = AlertHandlerId::new();
        self.handlers
            .write()
            .expect("monitoring poisoned")
            .push((id, handler));
        id
    }

    /// Unregister a previously registered handler.
    pub fn unregister_alert_handler(&self, id: AlertHandlerId) {
        self.handlers
            .write()
            .expect("monitoring poisoned")
            .retain(|(handler_id, _)| *handler_id != id);
    }

    /// Set (or clear, with `None`) the alert threshold for a metric. A
    /// sample at or above the threshold raises a generic `system_error`
    /// alert.
    pub fn set_threshold(&self, metric: impl Into<String>, threshold: Option<f64>) {
        let mut series = self.series.write().expect("monitoring poisoned");
        let entry = series.entry(metric.into()).or_insert_with(MetricSeries::empty);
        entry.threshold = threshold;
    }

    fn retention(&self) -> Duration {
        Duration::seconds(self.config.metrics_retention_period_secs)
    }

    /// Record a sample for `metric`, evicting samples older than the
    /// configured retention period, and raising a `system_error` alert if
    /// a registered threshold is crossed.
    pub fn record(&self, metric: impl Into<String>, value: f64, now: DateTime<Utc>) {
        let metric = metric.into();
        let retention = self.retention();
        let crossed = {
            let mut series = self.series.write().expect("monitoring poisoned");
            let entry = series.entry(metric.clone()).or_insert_with(MetricSeries::empty);
            entry.samples.push_back((now, value));
            entry.evict_older_than(now, retention);
            entry.threshold.filter(|t| value >= *t)
        };
        if let Some(threshold) = crossed {
            self.raise_typed_alert(
                AlertType::SystemError,
                AlertSeverity::Warning,
                metric,
                value,
                threshold,
                None,
                now,
            );
        }
    }

    fn mean_of(&self, metric: &str) -> Option<f64> {
        let series = self.series.read().expect("monitoring poisoned");
        let entry = series.get(metric)?;
        let values = entry.values();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    fn sum_of(&self, metric: &str) -> f64 {
        let series = self.series.read().expect("monitoring poisoned");
        series.get(metric).map(|e| e.values().iter().sum()).unwrap_or(0.0)
    }

    fn raise_typed_alert(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        metric: impl Into<String>,
        value: f64,
        threshold: f64,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> AlertId {
        let alert = Alert {
            id: AlertId::new(),
            alert_type,
            severity,
            metric: metric.into(),
            value,
            threshold,
            message,
            raised_at: now,
            resolved: false,
        };
        for (_, handler) in self.handlers.read().expect("monitoring poisoned").iter() {
            handler.handle(&alert);
        }
        let id = alert.id;
        self.alerts.write().expect("monitoring poisoned").push(alert);
        id
    }

    /// Record a single event-ingestion attempt.
    pub fn record_event_ingestion(
        &self,
        latency_ms: f64,
        success: bool,
        error_msg: Option<&str>,
        now: DateTime<Utc>,
    ) {
        self.record("event_ingestion.latency_ms", latency_ms, now);
        self.record(
            "event_ingestion.failure_rate",
            if success { 0.0 } else { 1.0 },
            now,
        );
        {
            let mut counters = self.event_counters.write().expect("monitoring poisoned");
            counters.ingested += 1;
            if !success {
                counters.failed += 1;
            }
        }
        let thresholds = &self.config.alert_thresholds;
        if latency_ms >= thresholds.processing_latency_p95_ms {
            self.raise_typed_alert(
                AlertType::PerformanceDegradation,
                AlertSeverity::Warning,
                "event_ingestion.latency_ms",
                latency_ms,
                thresholds.processing_latency_p95_ms,
                error_msg.map(str::to_string),
                now,
            );
        }
        if let Some(rate) = self.mean_of("event_ingestion.failure_rate") {
            if rate >= thresholds.validation_failure_rate {
                self.raise_typed_alert(
                    AlertType::ValidationFailure,
                    AlertSeverity::Critical,
                    "event_ingestion.failure_rate",
                    rate,
                    thresholds.validation_failure_rate,
                    error_msg.map(str::to_string),
                    now,
                );
            }
        }
    }

    /// Record a single query execution.
    pub fn record_query(
        &self,
        query_type: impl Into<String>,
        latency_ms: f64,
        cache_hit: bool,
        success: bool,
        error_msg: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let query_type = query_type.into();
        let latency_metric = format!("query.{query_type}.latency_ms");
        let failure_metric = format!("query.{query_type}.failure_rate");
        self.record(&latency_metric, latency_ms, now);
        self.record(&failure_metric, if success { 0.0 } else { 1.0 }, now);
        {
            let mut query_counters = self.query_counters.write().expect("monitoring poisoned");
            let counters = query_counters.entry(query_type.clone()).or_default();
            counters.total += 1;
            if !success {
                counters.failed += 1;
            }
            if cache_hit {
                counters.cache_hits += 1;
            }
        }
        let thresholds = &self.config.alert_thresholds;
        if latency_ms >= thresholds.query_latency_p95_ms {
            self.raise_typed_alert(
                AlertType::PerformanceDegradation,
                AlertSeverity::Warning,
                latency_metric,
                latency_ms,
                thresholds.query_latency_p95_ms,
                error_msg.map(str::to_string),
                now,
            );
        }
        if let Some(rate) = self.mean_of(&failure_metric) {
            if rate >= thresholds.query_error_rate {
                let severity = if rate >= thresholds.query_error_rate * 2.0 {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                };
                self.raise_typed_alert(
                    AlertType::SystemError,
                    severity,
                    failure_metric,
                    rate,
                    thresholds.query_error_rate,
                    error_msg.map(str::to_string),
                    now,
                );
            }
        }
    }

    /// Record that a holon was created.
    pub fn record_holon_created(&self, holon_type: HolonType, active: bool) {
        let mut business = self.business.write().expect("monitoring poisoned");
        *business.holons_created_by_type.entry(holon_type).or_insert(0) += 1;
        if active {
            *business.active_holons_by_type.entry(holon_type).or_insert(0) += 1;
        }
    }

    /// Record a holon transitioning into or out of active status.
    pub fn record_holon_status_change(&self, holon_type: HolonType, to_active: bool) {
        let mut business = self.business.write().expect("monitoring poisoned");
        let count = business.active_holons_by_type.entry(holon_type).or_insert(0);
        if to_active {
            *count += 1;
        } else {
            *count = count.saturating_sub(1);
        }
    }

    /// Record that a relationship was created.
    pub fn record_relationship_created(&self, relationship_type: RelationshipType) {
        let mut business = self.business.write().expect("monitoring poisoned");
        *business
            .relationships_created_by_type
            .entry(relationship_type)
            .or_insert(0) += 1;
    }

    /// Record that a relationship was ended.
    pub fn record_relationship_ended(&self, relationship_type: RelationshipType) {
        let mut business = self.business.write().expect("monitoring poisoned");
        *business
            .relationships_ended_by_type
            .entry(relationship_type)
            .or_insert(0) += 1;
    }

    /// Record a constraint violation, raising a `business_rule` alert
    /// once the windowed violation count for this constraint crosses the
    /// configured rate (interpreted as violations per hundred samples, in
    /// the absence of a tracked evaluation denominator).
    pub fn record_constraint_violation(&self, constraint_name: impl Into<String>, now: DateTime<Utc>) {
        let constraint_name = constraint_name.into();
        {
            let mut business = self.business.write().expect("monitoring poisoned");
            *business
                .constraint_violations_by_type
                .entry(constraint_name.clone())
                .or_insert(0) += 1;
        }
        let metric = format!("constraint.{constraint_name}.violations");
        self.record(&metric, 1.0, now);
        let threshold = self.config.alert_thresholds.constraint_violation_rate * 100.0;
        let count = self.sum_of(&metric);
        if count >= threshold {
            self.raise_typed_alert(
                AlertType::BusinessRule,
                AlertSeverity::Warning,
                metric,
                count,
                threshold,
                Some(format!("constraint {constraint_name} violated repeatedly")),
                now,
            );
        }
    }

    /// Report the current health of a named component.
    pub fn update_component_health(
        &self,
        name: impl Into<String>,
        status: ComponentHealthStatus,
        latency_ms: Option<f64>,
        message: Option<String>,
        now: DateTime<Utc>,
    ) {
        let name = name.into();
        let mut components = self.components.write().expect("monitoring poisoned");
        let previous_status = components.get(&name).map(|c| c.status);
        let error_count = match (previous_status, status) {
            (_, ComponentHealthStatus::Healthy) => 0,
            (Some(previous), _) if previous != ComponentHealthStatus::Healthy => {
                components.get(&name).map(|c| c.error_count + 1).unwrap_or(1)
            }
            _ => 1,
        };
        components.insert(
            name.clone(),
            ComponentHealth {
                name: name.clone(),
                status,
                latency_ms,
                message: message.clone(),
                error_count,
                updated_at: now,
            },
        );
        drop(components);
        if status != ComponentHealthStatus::Healthy {
            let severity = match status {
                ComponentHealthStatus::Unhealthy => AlertSeverity::Critical,
                ComponentHealthStatus::Degraded => AlertSeverity::Warning,
                ComponentHealthStatus::Healthy => unreachable!(),
            };
            self.raise_typed_alert(
                AlertType::SystemError,
                severity,
                format!("component.{name}"),
                0.0,
                0.0,
                message,
                now,
            );
        }
    }

    /// Event ingestion throughput and latency since the last reset.
    pub fn get_event_metrics(&self) -> EventMetrics {
        let counters = self.event_counters.read().expect("monitoring poisoned");
        let percentiles = self
            .percentiles("event_ingestion.latency_ms")
            .unwrap_or(Percentiles {
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            });
        let success_rate = if counters.ingested == 0 {
            1.0
        } else {
            (counters.ingested - counters.failed) as f64 / counters.ingested as f64
        };
        EventMetrics {
            total_ingested: counters.ingested,
            total_failed: counters.failed,
            success_rate,
            avg_latency_ms: self.mean_of("event_ingestion.latency_ms").unwrap_or(0.0),
            p95_latency_ms: percentiles.p95,
            p99_latency_ms: percentiles.p99,
        }
    }

    /// Query throughput, latency, and cache effectiveness by query type,
    /// since the last reset.
    pub fn get_query_metrics(&self) -> HashMap<String, QueryMetrics> {
        let query_counters = self.query_counters.read().expect("monitoring poisoned");
        query_counters
            .iter()
            .map(|(query_type, counters)| {
                let latency_metric = format!("query.{query_type}.latency_ms");
                let percentiles = self.percentiles(&latency_metric).unwrap_or(Percentiles {
                    p50: 0.0,
                    p95: 0.0,
                    p99: 0.0,
                });
                let cache_hit_rate = if counters.total == 0 {
                    0.0
                } else {
                    counters.cache_hits as f64 / counters.total as f64
                };
                (
                    query_type.clone(),
                    QueryMetrics {
                        total: counters.total,
                        failed: counters.failed,
                        cache_hit_rate,
                        avg_latency_ms: self.mean_of(&latency_metric).unwrap_or(0.0),
                        p95_latency_ms: percentiles.p95,
                    },
                )
            })
            .collect()
    }

    /// Domain-level activity and violation counters since the last reset.
    pub fn get_business_metrics(&self) -> BusinessMetrics {
        self.business.read().expect("monitoring poisoned").clone()
    }

    /// Aggregate system health across every reported component.
    pub fn get_system_health(&self) -> SystemHealth {
        let components = self.components.read().expect("monitoring poisoned");
        let mut list: Vec<ComponentHealth> = components.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        let overall = list
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentHealthStatus::Healthy);
        SystemHealth {
            overall,
            components: list,
        }
    }

    /// Percentile summary of a metric's currently retained samples.
    pub fn percentiles(&self, metric: &str) -> Option<Percentiles> {
        let series = self.series.read().expect("monitoring poisoned");
        let entry = series.get(metric)?;
        let mut sorted = entry.values();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Some(Percentiles {
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        })
    }

    /// Every alert raised so far, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().expect("monitoring poisoned").clone()
    }

    /// Alerts not yet acknowledged via [`Monitoring::resolve_alert`].
    pub fn get_active_alerts(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .expect("monitoring poisoned")
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// Acknowledge an alert so it no longer appears in
    /// [`Monitoring::get_active_alerts`].
    pub fn resolve_alert(&self, id: AlertId) {
        if let Some(alert) = self
            .alerts
            .write()
            .expect("monitoring poisoned")
            .iter_mut()
            .find(|a| a.id == id)
        {
            alert.resolved = true;
        }
    }

    /// Clear every metric, counter, component status, and alert. Registered
    /// handlers are left in place.
    pub fn reset(&self) {
        self.series.write().expect("monitoring poisoned").clear();
        self.alerts.write().expect("monitoring poisoned").clear();
        *self.event_counters.write().expect("monitoring poisoned") = EventCounters::default();
        self.query_counters.write().expect("monitoring poisoned").clear();
        *self.business.write().expect("monitoring poisoned") = BusinessMetrics::default();
        self.components.write().expect("monitoring poisoned").clear();
    }

    /// Reset all state and detach every registered alert handler. Intended
    /// for orderly process shutdown.
    pub fn shutdown(&self) {
        self.reset();
        self.handlers.write().expect("monitoring poisoned").clear();
    }
}

impl Default for Monitoring {
    fn default() -> Self {
        Self::new(MonitoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler(Arc<AtomicUsize>);
    impl AlertHandler for CountingHandler {
        fn handle(&self, _alert: &Alert) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> MonitoringConfig {
        MonitoringConfig::default()
    }

    #[test]
    fn percentiles_computed_over_retained_samples() {
        let monitoring = Monitoring::new(config());
        let now = Utc::now();
        for i in 1..=100 {
            monitoring.record("latency_ms", i as f64, now);
        }
        let percentiles = monitoring.percentiles("latency_ms").unwrap();
        assert_eq!(percentiles.p50, 50.0);
        assert_eq!(percentiles.p99, 99.0);
    }

    #[test]
    fn retention_period_evicts_samples_older_than_window() {
        let mut cfg = config();
        cfg.metrics_retention_period_secs = 60;
        let monitoring = Monitoring::new(cfg);
        let start = Utc::now();
        monitoring.record("x", 1.0, start);
        monitoring.record("x", 2.0, start + chrono::Duration::seconds(30));
        monitoring.record("x", 3.0, start + chrono::Duration::seconds(120));
        let percentiles = monitoring.percentiles("x").unwrap();
        assert_eq!(percentiles.p50, 3.0);
    }

    #[test]
    fn threshold_crossing_triggers_registered_handlers() {
        let monitoring = Monitoring::new(config());
        let count = Arc::new(AtomicUsize::new(0));
        monitoring.register_alert_handler(Box::new(CountingHandler(count.clone())));
        monitoring.set_threshold("error_rate", Some(0.5));
        monitoring.record("error_rate", 0.9, Utc::now());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(monitoring.alerts().len(), 1);
    }

    #[test]
    fn below_threshold_does_not_alert() {
        let monitoring = Monitoring::new(config());
        monitoring.set_threshold("error_rate", Some(0.5));
        monitoring.record("error_rate", 0.1, Utc::now());
        assert!(monitoring.alerts().is_empty());
    }

    #[test]
    fn event_ingestion_failure_rate_raises_validation_failure_alert() {
        let monitoring = Monitoring::new(config());
        let now = Utc::now();
        for _ in 0..10 {
            monitoring.record_event_ingestion(10.0, false, Some("boom"), now);
        }
        let metrics = monitoring.get_event_metrics();
        assert_eq!(metrics.total_ingested, 10);
        assert_eq!(metrics.total_failed, 10);
        assert!(monitoring
            .alerts()
            .iter()
            .any(|a| a.alert_type == AlertType::ValidationFailure));
    }

    #[test]
    fn slow_query_raises_performance_degradation_alert() {
        let monitoring = Monitoring::new(config());
        let now = Utc::now();
        monitoring.record_query("getHolon", 5_000.0, false, true, None, now);
        let metrics = monitoring.get_query_metrics();
        assert_eq!(metrics.get("getHolon").unwrap().total, 1);
        assert!(monitoring
            .alerts()
            .iter()
            .any(|a| a.alert_type == AlertType::PerformanceDegradation));
    }

    #[test]
    fn component_health_recovery_resets_error_count() {
        let monitoring = Monitoring::new(config());
        let now = Utc::now();
        monitoring.update_component_health(
            "event_store",
            ComponentHealthStatus::Unhealthy,
            None,
            Some("down".into()),
            now,
        );
        monitoring.update_component_health("event_store", ComponentHealthStatus::Healthy, None, None, now);
        let health = monitoring.get_system_health();
        let component = health.components.iter().find(|c| c.name == "event_store").unwrap();
        assert_eq!(component.error_count, 0);
        assert_eq!(health.overall, ComponentHealthStatus::Healthy);
    }

    #[test]
    fn reset_clears_counters_and_alerts() {
        let monitoring = Monitoring::new(config());
        let now = Utc::now();
        monitoring.record_event_ingestion(10.0, false, None, now);
        monitoring.reset();
        assert_eq!(monitoring.get_event_metrics().total_ingested, 0);
        assert!(monitoring.alerts().is_empty());
    }
}
