// src/config/mod.rs
//! Configuration management
//!
//! TOML configuration with defaults from [`constants`], file merging and
//! environment overrides in [`loader`], and dotted-path schema checks in
//! [`schema_validator`].

pub mod constants;
pub mod detector_config;
pub mod loader;
pub mod schema_validator;

pub use detector_config::*;
pub use loader::{ConfigError, ConfigLoader};
pub use schema_validator::{FieldConstraint, FieldViolation, SchemaValidator};

use crate::detection::protocol::TestKind;
use crate::sensor::simulator::SimulatorConfig;
use crate::sensor::types::SourceType;
use crate::utils::conversion::ReportUnit;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete system configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub system: SystemSettings,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub tests: TestSuiteConfig,
}

/// Session-level settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemSettings {
    #[serde(default = "defaults::default_test")]
    pub default_test: TestKind,

    /// Stop a session loop after this many frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_session_frames: Option<u64>,
}

/// Skeleton source settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SensorConfig {
    #[serde(default = "defaults::source_type")]
    pub source_type: SourceType,

    #[serde(default = "defaults::frame_rate_hz")]
    pub frame_rate_hz: u32,

    #[serde(default = "defaults::open_timeout_ms")]
    pub open_timeout_ms: u32,

    pub simulator: Option<SimulatorConfig>,
}

/// Result CSV settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReportingConfig {
    #[serde(default = "defaults::reporting_enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::results_dir")]
    pub results_dir: PathBuf,

    #[serde(default)]
    pub unit: ReportUnit,

    #[serde(default = "defaults::decimal_precision")]
    pub decimal_precision: usize,
}

/// Announcement queue settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpeechConfig {
    #[serde(default = "defaults::speech_enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::queue_capacity")]
    pub queue_capacity: usize,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use crate::detection::protocol::TestKind;
    use crate::sensor::types::SourceType;
    use std::path::PathBuf;

    pub fn default_test() -> TestKind { TestKind::ForwardBend }

    pub fn source_type() -> SourceType { SourceType::Simulator }
    pub fn frame_rate_hz() -> u32 { sensor::DEFAULT_FRAME_RATE_HZ }
    pub fn open_timeout_ms() -> u32 { sensor::DEFAULT_OPEN_TIMEOUT_MS }

    pub fn reporting_enabled() -> bool { true }
    pub fn results_dir() -> PathBuf { PathBuf::from(reporting::DEFAULT_RESULTS_DIR) }
    pub fn decimal_precision() -> usize { reporting::DEFAULT_DECIMAL_PRECISION }

    pub fn speech_enabled() -> bool { true }
    pub fn queue_capacity() -> usize { speech::DEFAULT_QUEUE_CAPACITY }
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            default_test: defaults::default_test(),
            max_session_frames: None,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source_type: defaults::source_type(),
            frame_rate_hz: defaults::frame_rate_hz(),
            open_timeout_ms: defaults::open_timeout_ms(),
            simulator: Some(SimulatorConfig::default()),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::reporting_enabled(),
            results_dir: defaults::results_dir(),
            unit: ReportUnit::default(),
            decimal_precision: defaults::decimal_precision(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::speech_enabled(),
            queue_capacity: defaults::queue_capacity(),
        }
    }
}

impl ReportingConfig {
    /// CSV path for one test's results
    pub fn results_path(&self, kind: TestKind) -> PathBuf {
        self.results_dir.join(kind.results_file())
    }
}

impl SystemConfig {
    /// Validate configuration consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = validate_test_suite(&self.tests) {
            errors.push(e.to_string());
        }

        if self.sensor.frame_rate_hz < constants::sensor::MIN_FRAME_RATE_HZ
            || self.sensor.frame_rate_hz > constants::sensor::MAX_FRAME_RATE_HZ
        {
            errors.push(format!(
                "Sensor frame rate ({} Hz) outside [{}, {}] Hz",
                self.sensor.frame_rate_hz,
                constants::sensor::MIN_FRAME_RATE_HZ,
                constants::sensor::MAX_FRAME_RATE_HZ
            ));
        }

        if let Some(simulator) = &self.sensor.simulator {
            if let Err(e) = simulator.validate() {
                errors.push(format!("Simulator: {}", e));
            }
        }

        if self.reporting.decimal_precision > constants::reporting::MAX_DECIMAL_PRECISION {
            errors.push(format!(
                "Decimal precision {} exceeds maximum {}",
                self.reporting.decimal_precision,
                constants::reporting::MAX_DECIMAL_PRECISION
            ));
        }

        if self.reporting.enabled && self.reporting.results_dir.as_os_str().is_empty() {
            errors.push("Results directory must be set when reporting is enabled".to_string());
        }

        if self.speech.queue_capacity == 0
            || self.speech.queue_capacity > constants::speech::MAX_QUEUE_CAPACITY
        {
            errors.push(format!(
                "Speech queue capacity {} outside [1, {}]",
                self.speech.queue_capacity,
                constants::speech::MAX_QUEUE_CAPACITY
            ));
        }

        // a timeout shorter than the window can reset a session that is merely settling
        for kind in TestKind::ALL {
            let detector = kind.detector_config(&self.tests);
            if let Some(timeout) = detector.phase_timeout_frames {
                if (timeout as usize) < detector.stability_window_frames {
                    errors.push(format!(
                        "{}: phase timeout ({} frames) shorter than stability window ({} frames)",
                        kind, timeout, detector.stability_window_frames
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Simulator settings, falling back to defaults when the section is absent
    pub fn simulator(&self) -> SimulatorConfig {
        let mut simulator = self.sensor.simulator.clone().unwrap_or_default();
        simulator.frame_rate_hz = self.sensor.frame_rate_hz;
        simulator
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            default_test: self.system.default_test,
            source_type: self.sensor.source_type.clone(),
            frame_rate_hz: self.sensor.frame_rate_hz,
            report_unit: self.reporting.unit,
            results_dir: self.reporting.results_dir.clone(),
            speech_enabled: self.speech.enabled,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub default_test: TestKind,
    pub source_type: SourceType,
    pub frame_rate_hz: u32,
    pub report_unit: ReportUnit,
    pub results_dir: PathBuf,
    pub speech_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = SystemConfig::default();
        assert_eq!(config.sensor.frame_rate_hz, constants::sensor::DEFAULT_FRAME_RATE_HZ);
        assert_eq!(config.reporting.unit, ReportUnit::Centimetres);
        assert!(config.validate_consistency().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = SystemConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: SystemConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SystemConfig = toml::from_str(
            r#"
[system]
default_test = "up_and_go"

[reporting]
unit = "metres"
"#,
        )
        .unwrap();
        assert_eq!(config.system.default_test, TestKind::UpAndGo);
        assert_eq!(config.reporting.unit, ReportUnit::Metres);
        assert_eq!(config.reporting.decimal_precision, 2);
        assert_eq!(config.tests, TestSuiteConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SystemConfig::default();
        config.speech.queue_capacity = 0;
        config.reporting.decimal_precision = 12;

        let errors = config.validate_consistency().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_short_timeout_rejected() {
        let mut config = SystemConfig::default();
        config.tests.forward_bend.detector.phase_timeout_frames = Some(5);
        assert!(config.validate_consistency().is_err());
    }

    #[test]
    fn test_results_path() {
        let mut config = SystemConfig::default();
        config.reporting.results_dir = PathBuf::from("/tmp/results");
        assert_eq!(
            config.reporting.results_path(TestKind::UpAndGo),
            PathBuf::from("/tmp/results/TUG_Test_Results.csv")
        );
    }

    #[test]
    fn test_summary() {
        let summary = SystemConfig::default().get_summary();
        assert_eq!(summary.default_test, TestKind::ForwardBend);
        assert_eq!(summary.source_type, SourceType::Simulator);
        assert!(summary.speech_enabled);
    }
}
