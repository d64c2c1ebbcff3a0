// Copyright 2025 Cowboy AI, LLC.

//! Runtime configuration for domain managers.
//!
//! Every field has a default matching the documented reference behavior;
//! callers override only what they need via `..Default::default()`.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::domain::person::PersonManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonManagerConfig {
    /// Maximum number of concurrent position assignments a person may hold.
    pub max_concurrent_positions: usize,
}

impl Default for PersonManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_positions: 3,
        }
    }
}

/// Configuration for [`crate::domain::qualification::QualificationManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationManagerConfig {
    /// Days before expiration at which a renewal warning is raised.
    pub renewal_warning_days: i64,
}

impl Default for QualificationManagerConfig {
    fn default() -> Self {
        Self {
            renewal_warning_days: 30,
        }
    }
}

/// Alert thresholds for [`crate::monitoring::Monitoring`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Fraction of validated events over the retention window that may
    /// fail before a `validation_failure` alert is raised.
    pub validation_failure_rate: f64,
    /// Fraction of queries over the retention window that may fail before
    /// a `system_error` alert is raised.
    pub query_error_rate: f64,
    /// A single event-ingestion latency sample above this many
    /// milliseconds raises a `performance_degradation` alert.
    pub processing_latency_p95_ms: f64,
    /// A single query latency sample above this many milliseconds raises
    /// a `performance_degradation` alert.
    pub query_latency_p95_ms: f64,
    /// Fraction of constraint evaluations over the retention window that
    /// may fail before a `business_rule` alert is raised.
    pub constraint_violation_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            validation_failure_rate: 0.05,
            query_error_rate: 0.05,
            processing_latency_p95_ms: 500.0,
            query_latency_p95_ms: 500.0,
            constraint_violation_rate: 0.10,
        }
    }
}

/// Configuration for [`crate::monitoring::Monitoring`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// How long, in seconds, a metric sample is retained before eviction.
    pub metrics_retention_period_secs: i64,
    /// How often, in seconds, component health is expected to be
    /// refreshed.
    pub health_check_interval_secs: i64,
    /// Thresholds that trigger alerts.
    pub alert_thresholds: AlertThresholds,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_retention_period_secs: 3_600,
            health_check_interval_secs: 30,
            alert_thresholds: AlertThresholds::default(),
        }
    }
}
