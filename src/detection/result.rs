// src/detection/result.rs
//! Session results

use crate::detection::protocol::TestKind;
use crate::utils::conversion::{format_decimal, ReportUnit};
use serde::{Deserialize, Serialize};

/// Physical quantity a metric carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Length in metres; rescaled at the reporting boundary
    Metres,
    Seconds,
    MetresPerSecond,
}

impl MetricUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            MetricUnit::Metres => "m",
            MetricUnit::Seconds => "s",
            MetricUnit::MetresPerSecond => "m/s",
        }
    }
}

/// Named scalar produced by a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
}

impl Metric {
    pub fn length(name: impl Into<String>, metres: f64) -> Self {
        Self {
            name: name.into(),
            value: metres,
            unit: MetricUnit::Metres,
        }
    }

    pub fn duration(name: impl Into<String>, seconds: f64) -> Self {
        Self {
            name: name.into(),
            value: seconds,
            unit: MetricUnit::Seconds,
        }
    }

    pub fn speed(name: impl Into<String>, metres_per_second: f64) -> Self {
        Self {
            name: name.into(),
            value: metres_per_second,
            unit: MetricUnit::MetresPerSecond,
        }
    }
}

/// Metric converted into the report unit
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledMetric {
    pub name: String,
    pub value: f64,
    pub symbol: &'static str,
}

impl ScaledMetric {
    /// CSV column title, e.g. `Right Hand (cm)`
    pub fn column_title(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }

    pub fn formatted(&self, precision: usize) -> String {
        format_decimal(self.value, precision)
    }
}

/// Outcome of one completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub kind: TestKind,
    pub metrics: Vec<Metric>,
    pub frame_index: u64,
    pub timestamp_nanos: u64,
}

impl SessionResult {
    pub fn new(kind: TestKind, metrics: Vec<Metric>, frame_index: u64, timestamp_nanos: u64) -> Self {
        Self {
            kind,
            metrics,
            frame_index,
            timestamp_nanos,
        }
    }

    /// Raw value of a metric by name
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }

    pub fn width(&self) -> usize {
        self.metrics.len()
    }

    /// Metrics with lengths converted to `unit`; durations and speeds pass through
    pub fn scaled(&self, unit: ReportUnit) -> Vec<ScaledMetric> {
        self.metrics
            .iter()
            .map(|metric| match metric.unit {
                MetricUnit::Metres => ScaledMetric {
                    name: metric.name.clone(),
                    value: unit.from_metres(metric.value),
                    symbol: unit.symbol(),
                },
                other => ScaledMetric {
                    name: metric.name.clone(),
                    value: metric.value,
                    symbol: other.symbol(),
                },
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reach_result() -> SessionResult {
        SessionResult::new(
            TestKind::FunctionalReach,
            vec![Metric::length("Right Hand", 0.4), Metric::length("Left Hand", 0.35)],
            120,
            4_000_000_000,
        )
    }

    #[test]
    fn test_scaling_only_touches_lengths() {
        let result = SessionResult::new(
            TestKind::UpAndGo,
            vec![Metric::duration("Time", 9.5), Metric::length("Distance", 3.0)],
            10,
            0,
        );
        let scaled = result.scaled(ReportUnit::Centimetres);
        assert_eq!(scaled[0].value, 9.5);
        assert_eq!(scaled[0].column_title(), "Time (s)");
        assert!((scaled[1].value - 300.0).abs() < 1e-9);
        assert_eq!(scaled[1].column_title(), "Distance (cm)");
    }

    #[test]
    fn test_metric_lookup() {
        let result = reach_result();
        assert_eq!(result.metric("Left Hand"), Some(0.35));
        assert_eq!(result.metric("Missing"), None);
        assert_eq!(result.width(), 2);
    }

    #[test]
    fn test_json_export() {
        let json = reach_result().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "functional_reach");
        assert_eq!(value["metrics"][0]["name"], "Right Hand");
        assert_eq!(value["metrics"][0]["unit"], "metres");
    }
}
