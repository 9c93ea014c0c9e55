// src/config/schema_validator.rs
//! Configuration schema validation

use crate::config::constants::*;
use std::collections::HashMap;
use thiserror::Error;

/// Single field that failed its schema constraint
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Validation error for '{field}': {message} (value: {value})")]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
    pub value: String,
}

/// Schema validator for configuration
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    constraints: HashMap<String, FieldConstraint>,
}

/// Field validation constraints
#[derive(Debug, Clone)]
pub enum FieldConstraint {
    Range { min: f64, max: f64 },
    IntRange { min: i64, max: i64 },
    OneOf(Vec<String>),
    MinLength(usize),
}

const TEST_SECTIONS: [&str; 4] = ["functional_reach", "forward_bend", "up_and_go", "walking_speed"];

const DISTANCE_FIELDS: [&str; 5] = [
    "level_tolerance_m",
    "rise_threshold_m",
    "motion_threshold_m",
    "lateral_tolerance_m",
    "returned_tolerance_m",
];

impl SchemaValidator {
    /// Create new schema validator with default constraints
    pub fn new() -> Self {
        let mut constraints = HashMap::new();

        constraints.insert(
            "system.default_test".to_string(),
            FieldConstraint::OneOf(TEST_SECTIONS.iter().map(|s| s.to_string()).collect()),
        );

        // Sensor constraints
        constraints.insert(
            "sensor.source_type".to_string(),
            FieldConstraint::OneOf(vec!["simulator".to_string(), "kinect".to_string()]),
        );
        constraints.insert(
            "sensor.frame_rate_hz".to_string(),
            FieldConstraint::IntRange {
                min: sensor::MIN_FRAME_RATE_HZ as i64,
                max: sensor::MAX_FRAME_RATE_HZ as i64,
            },
        );
        constraints.insert(
            "sensor.open_timeout_ms".to_string(),
            FieldConstraint::IntRange { min: 100, max: 60000 },
        );
        constraints.insert(
            "sensor.simulator.jitter_m".to_string(),
            FieldConstraint::Range {
                min: 0.0,
                max: simulation::MAX_JITTER_M as f64,
            },
        );
        constraints.insert(
            "sensor.simulator.dropout_probability".to_string(),
            FieldConstraint::Range { min: 0.0, max: 1.0 },
        );

        // Reporting constraints
        constraints.insert(
            "reporting.unit".to_string(),
            FieldConstraint::OneOf(vec!["metres".to_string(), "centimetres".to_string()]),
        );
        constraints.insert(
            "reporting.decimal_precision".to_string(),
            FieldConstraint::IntRange {
                min: 0,
                max: reporting::MAX_DECIMAL_PRECISION as i64,
            },
        );
        constraints.insert("reporting.results_dir".to_string(), FieldConstraint::MinLength(1));

        constraints.insert(
            "speech.queue_capacity".to_string(),
            FieldConstraint::IntRange {
                min: 1,
                max: speech::MAX_QUEUE_CAPACITY as i64,
            },
        );

        // Per-test detector constraints
        for test in TEST_SECTIONS {
            let prefix = format!("tests.{}.detector", test);
            constraints.insert(
                format!("{}.stability_window_frames", prefix),
                FieldConstraint::IntRange {
                    min: stability::MIN_WINDOW_FRAMES as i64,
                    max: stability::MAX_WINDOW_FRAMES as i64,
                },
            );
            constraints.insert(
                format!("{}.stability_threshold_m", prefix),
                FieldConstraint::Range {
                    min: stability::MIN_THRESHOLD_M as f64,
                    max: stability::MAX_THRESHOLD_M as f64,
                },
            );
            constraints.insert(
                format!("{}.extremum_confirm_frames", prefix),
                FieldConstraint::IntRange {
                    min: 1,
                    max: detection::MAX_EXTREMUM_CONFIRM_FRAMES as i64,
                },
            );
            for field in DISTANCE_FIELDS {
                constraints.insert(
                    format!("{}.{}", prefix, field),
                    FieldConstraint::Range {
                        min: 0.0,
                        max: detection::MAX_TOLERANCE_M as f64,
                    },
                );
            }
        }

        for field in ["arm_alignment_tolerance_m", "raise_margin_m"] {
            constraints.insert(
                format!("tests.functional_reach.{}", field),
                FieldConstraint::Range {
                    min: 0.0,
                    max: detection::MAX_TOLERANCE_M as f64,
                },
            );
        }

        Self { constraints }
    }

    /// Validate configuration value against schema
    pub fn validate_field(&self, field_path: &str, value: &toml::Value) -> Result<(), FieldViolation> {
        if let Some(constraint) = self.constraints.get(field_path) {
            self.check_constraint(field_path, value, constraint)
        } else {
            Ok(()) // Unknown fields are allowed for extensibility
        }
    }

    /// Validate entire configuration
    pub fn validate_config(&self, config: &toml::Value) -> Result<(), Vec<FieldViolation>> {
        let mut errors = Vec::new();

        self.validate_recursive("", config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check cross-field dependencies
    pub fn validate_dependencies(&self, config: &toml::Value) -> Result<(), Vec<FieldViolation>> {
        let mut errors = Vec::new();

        // Every zone must be ordered near < far
        for zone in [
            "tests.up_and_go.seated_zone",
            "tests.up_and_go.return_zone",
            "tests.up_and_go.target_zone",
            "tests.walking_speed.start_zone",
            "tests.walking_speed.finish_zone",
        ] {
            if let Some((near, far)) = self.zone(config, zone) {
                if near >= far {
                    errors.push(FieldViolation {
                        field: zone.to_string(),
                        message: "near_m must be less than far_m".to_string(),
                        value: format!("near: {}, far: {}", near, far),
                    });
                }
            }
        }

        if let (Some((_, target_far)), Some((seated_near, _))) = (
            self.zone(config, "tests.up_and_go.target_zone"),
            self.zone(config, "tests.up_and_go.seated_zone"),
        ) {
            if target_far >= seated_near {
                errors.push(FieldViolation {
                    field: "tests.up_and_go.target_zone".to_string(),
                    message: "Target zone must be closer to the sensor than the chair".to_string(),
                    value: format!("target far: {}, seated near: {}", target_far, seated_near),
                });
            }
        }

        if let (Some((_, finish_far)), Some((start_near, _))) = (
            self.zone(config, "tests.walking_speed.finish_zone"),
            self.zone(config, "tests.walking_speed.start_zone"),
        ) {
            if finish_far >= start_near {
                errors.push(FieldViolation {
                    field: "tests.walking_speed.finish_zone".to_string(),
                    message: "Finish line must be closer to the sensor than the start line".to_string(),
                    value: format!("finish far: {}, start near: {}", finish_far, start_near),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn zone(&self, config: &toml::Value, path: &str) -> Option<(f64, f64)> {
        let near = number(self.get_nested_value(config, &format!("{}.near_m", path))?)?;
        let far = number(self.get_nested_value(config, &format!("{}.far_m", path))?)?;
        Some((near, far))
    }

    fn validate_recursive(&self, prefix: &str, value: &toml::Value, errors: &mut Vec<FieldViolation>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };

                    if val.is_table() {
                        self.validate_recursive(&path, val, errors);
                    } else if let Err(err) = self.validate_field(&path, val) {
                        errors.push(err);
                    }
                }
            }
            _ => {
                if let Err(err) = self.validate_field(prefix, value) {
                    errors.push(err);
                }
            }
        }
    }

    fn check_constraint(&self, field: &str, value: &toml::Value, constraint: &FieldConstraint) -> Result<(), FieldViolation> {
        match constraint {
            FieldConstraint::Range { min, max } => {
                if let Some(val) = number(value) {
                    if val < *min || val > *max {
                        return Err(FieldViolation {
                            field: field.to_string(),
                            message: format!("Value must be between {} and {}", min, max),
                            value: val.to_string(),
                        });
                    }
                }
            }
            FieldConstraint::IntRange { min, max } => {
                if let Some(val) = value.as_integer() {
                    if val < *min || val > *max {
                        return Err(FieldViolation {
                            field: field.to_string(),
                            message: format!("Value must be between {} and {}", min, max),
                            value: val.to_string(),
                        });
                    }
                }
            }
            FieldConstraint::OneOf(options) => {
                if let Some(val) = value.as_str() {
                    let val_lower = val.to_lowercase();
                    if !options.iter().any(|opt| opt.to_lowercase() == val_lower) {
                        return Err(FieldViolation {
                            field: field.to_string(),
                            message: format!("Value must be one of: {}", options.join(", ")),
                            value: val.to_string(),
                        });
                    }
                }
            }
            FieldConstraint::MinLength(min_len) => {
                if let Some(val) = value.as_str() {
                    if val.len() < *min_len {
                        return Err(FieldViolation {
                            field: field.to_string(),
                            message: format!("Minimum length is {}", min_len),
                            value: val.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn get_nested_value<'a>(&self, config: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
        let mut current = config;
        for part in path.split('.') {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Floats and integers both count as numbers
fn number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}
