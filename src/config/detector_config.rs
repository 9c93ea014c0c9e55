// src/config/detector_config.rs
//! Motion-phase detector configuration structures

use crate::config::constants::{
    detection, forward_bend, functional_reach, stability, up_and_go, walking_speed,
};
use crate::utils::validation::{
    validate_positive_distance, validate_range, validate_zone, ValidationError, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Thresholds driving one detector instance
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Frames a stability window must hold before it can report stable
    pub stability_window_frames: usize,
    /// Maximum peak-to-peak spread of a stable window
    pub stability_threshold_m: f32,
    /// Whether `Ready -> MotionInitiated` also waits for stable windows
    pub require_stability_to_initiate: bool,
    /// Tolerance of the "joints level with each other" predicates
    pub level_tolerance_m: f32,
    /// Vertical rise that counts as standing up / raising
    pub rise_threshold_m: f32,
    /// Principal-axis displacement that starts extremum tracking
    pub motion_threshold_m: f32,
    /// Allowed drift of lateral axes from the motion baseline
    pub lateral_tolerance_m: f32,
    /// Distance from the motion baseline that counts as returned
    pub returned_tolerance_m: f32,
    /// Consecutive decreasing frames that confirm the extremum has passed
    pub extremum_confirm_frames: u32,
    /// Frames a phase may last before the session is reset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_timeout_frames: Option<u32>,
    /// Moving-average window applied to joint positions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing_window_frames: Option<usize>,
}

/// Depth interval along the sensor's Z axis
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct DepthZone {
    pub near_m: f32,
    pub far_m: f32,
}

impl DepthZone {
    pub const fn new(near_m: f32, far_m: f32) -> Self {
        Self { near_m, far_m }
    }

    pub fn contains(&self, depth_m: f32) -> bool {
        depth_m >= self.near_m && depth_m <= self.far_m
    }

    pub fn centre(&self) -> f32 {
        (self.near_m + self.far_m) / 2.0
    }
}

impl From<(f32, f32)> for DepthZone {
    fn from((near_m, far_m): (f32, f32)) -> Self {
        Self { near_m, far_m }
    }
}

/// Functional reach test configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FunctionalReachConfig {
    /// Hand-elbow horizontal offset allowed while the arms hang ready
    pub arm_alignment_tolerance_m: f32,
    /// Hands count as raised once no more than this below the elbows
    pub raise_margin_m: f32,
    pub detector: DetectorConfig,
}

/// Seated forward bend test configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ForwardBendConfig {
    pub detector: DetectorConfig,
}

/// Timed up and go test configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UpAndGoConfig {
    /// Hip-knee vertical tolerance when sitting back down
    pub return_leg_tolerance_m: f32,
    pub detector: DetectorConfig,
    /// Mid-spine depth while seated on the chair
    pub seated_zone: DepthZone,
    /// Mid-spine depth that counts as back at the chair
    pub return_zone: DepthZone,
    /// Depth the subject must reach before turning around
    pub target_zone: DepthZone,
}

/// Walking speed test configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WalkingSpeedConfig {
    pub detector: DetectorConfig,
    pub start_zone: DepthZone,
    pub finish_zone: DepthZone,
}

/// Per-test configuration for the whole battery
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct TestSuiteConfig {
    #[serde(default)]
    pub functional_reach: FunctionalReachConfig,
    #[serde(default)]
    pub forward_bend: ForwardBendConfig,
    #[serde(default)]
    pub up_and_go: UpAndGoConfig,
    #[serde(default)]
    pub walking_speed: WalkingSpeedConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stability_window_frames: stability::DEFAULT_WINDOW_FRAMES,
            stability_threshold_m: stability::DEFAULT_THRESHOLD_M,
            require_stability_to_initiate: true,
            level_tolerance_m: detection::DEFAULT_LEVEL_TOLERANCE_M,
            rise_threshold_m: detection::DEFAULT_RISE_THRESHOLD_M,
            motion_threshold_m: detection::DEFAULT_MOTION_THRESHOLD_M,
            lateral_tolerance_m: detection::DEFAULT_LATERAL_TOLERANCE_M,
            returned_tolerance_m: detection::DEFAULT_RETURNED_TOLERANCE_M,
            extremum_confirm_frames: detection::DEFAULT_EXTREMUM_CONFIRM_FRAMES,
            phase_timeout_frames: None,
            smoothing_window_frames: None,
        }
    }
}

impl Default for FunctionalReachConfig {
    fn default() -> Self {
        Self {
            arm_alignment_tolerance_m: functional_reach::ARM_ALIGNMENT_TOLERANCE_M,
            raise_margin_m: functional_reach::RAISE_MARGIN_M,
            detector: DetectorConfig {
                stability_window_frames: stability::ARM_LEVEL_WINDOW_FRAMES,
                level_tolerance_m: functional_reach::LEVEL_TOLERANCE_M,
                motion_threshold_m: functional_reach::MOTION_THRESHOLD_M,
                lateral_tolerance_m: functional_reach::LATERAL_TOLERANCE_M,
                returned_tolerance_m: functional_reach::RETURNED_TOLERANCE_M,
                ..DetectorConfig::default()
            },
        }
    }
}

impl Default for ForwardBendConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig {
                stability_window_frames: stability::SEATED_WINDOW_FRAMES,
                level_tolerance_m: forward_bend::LEVEL_TOLERANCE_M,
                motion_threshold_m: forward_bend::MOTION_THRESHOLD_M,
                lateral_tolerance_m: forward_bend::LATERAL_TOLERANCE_M,
                returned_tolerance_m: forward_bend::RETURNED_TOLERANCE_M,
                ..DetectorConfig::default()
            },
        }
    }
}

impl Default for UpAndGoConfig {
    fn default() -> Self {
        Self {
            return_leg_tolerance_m: up_and_go::RETURN_LEG_TOLERANCE_M,
            detector: DetectorConfig {
                require_stability_to_initiate: false,
                level_tolerance_m: up_and_go::LEG_LEVEL_TOLERANCE_M,
                rise_threshold_m: up_and_go::RISE_THRESHOLD_M,
                motion_threshold_m: up_and_go::MOTION_THRESHOLD_M,
                ..DetectorConfig::default()
            },
            seated_zone: up_and_go::SEATED_ZONE_M.into(),
            return_zone: up_and_go::RETURN_ZONE_M.into(),
            target_zone: up_and_go::TARGET_ZONE_M.into(),
        }
    }
}

impl Default for WalkingSpeedConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig {
                require_stability_to_initiate: false,
                motion_threshold_m: walking_speed::MOTION_THRESHOLD_M,
                smoothing_window_frames: Some(walking_speed::SMOOTHING_WINDOW_FRAMES),
                ..DetectorConfig::default()
            },
            start_zone: walking_speed::START_ZONE_M.into(),
            finish_zone: walking_speed::FINISH_ZONE_M.into(),
        }
    }
}

/// Validate one detector configuration
pub fn validate_detector_config(config: &DetectorConfig) -> ValidationResult<()> {
    validate_range(
        "stability_window_frames",
        config.stability_window_frames,
        stability::MIN_WINDOW_FRAMES,
        stability::MAX_WINDOW_FRAMES,
    )?;
    validate_range(
        "stability_threshold_m",
        config.stability_threshold_m,
        stability::MIN_THRESHOLD_M,
        stability::MAX_THRESHOLD_M,
    )?;

    for (field, value) in [
        ("level_tolerance_m", config.level_tolerance_m),
        ("rise_threshold_m", config.rise_threshold_m),
        ("motion_threshold_m", config.motion_threshold_m),
        ("lateral_tolerance_m", config.lateral_tolerance_m),
        ("returned_tolerance_m", config.returned_tolerance_m),
    ] {
        validate_positive_distance(field, value, detection::MAX_TOLERANCE_M)?;
    }

    validate_range(
        "extremum_confirm_frames",
        config.extremum_confirm_frames,
        1,
        detection::MAX_EXTREMUM_CONFIRM_FRAMES,
    )?;

    if let Some(timeout) = config.phase_timeout_frames {
        if timeout == 0 {
            return Err(ValidationError::Custom(
                "phase_timeout_frames must be greater than 0 when set".to_string(),
            ));
        }
    }

    if let Some(window) = config.smoothing_window_frames {
        validate_range(
            "smoothing_window_frames",
            window,
            1,
            detection::MAX_SMOOTHING_WINDOW_FRAMES,
        )?;
    }

    Ok(())
}

/// Validate every test configuration of the battery
pub fn validate_test_suite(config: &TestSuiteConfig) -> ValidationResult<()> {
    let frt = &config.functional_reach;
    validate_detector_config(&frt.detector)?;
    validate_positive_distance(
        "functional_reach.arm_alignment_tolerance_m",
        frt.arm_alignment_tolerance_m,
        detection::MAX_TOLERANCE_M,
    )?;
    validate_positive_distance(
        "functional_reach.raise_margin_m",
        frt.raise_margin_m,
        detection::MAX_TOLERANCE_M,
    )?;
    validate_detector_config(&config.forward_bend.detector)?;

    let tug = &config.up_and_go;
    validate_detector_config(&tug.detector)?;
    validate_zone("up_and_go.seated_zone", tug.seated_zone.near_m, tug.seated_zone.far_m)?;
    validate_zone("up_and_go.return_zone", tug.return_zone.near_m, tug.return_zone.far_m)?;
    validate_zone("up_and_go.target_zone", tug.target_zone.near_m, tug.target_zone.far_m)?;
    validate_positive_distance(
        "up_and_go.return_leg_tolerance_m",
        tug.return_leg_tolerance_m,
        detection::MAX_TOLERANCE_M,
    )?;
    if tug.target_zone.far_m >= tug.seated_zone.near_m {
        return Err(ValidationError::ConstraintViolation {
            fields: vec![
                "up_and_go.target_zone".to_string(),
                "up_and_go.seated_zone".to_string(),
            ],
            message: "target zone must be closer to the sensor than the chair".to_string(),
        });
    }

    let wst = &config.walking_speed;
    validate_detector_config(&wst.detector)?;
    validate_zone("walking_speed.start_zone", wst.start_zone.near_m, wst.start_zone.far_m)?;
    validate_zone("walking_speed.finish_zone", wst.finish_zone.near_m, wst.finish_zone.far_m)?;
    if wst.finish_zone.far_m >= wst.start_zone.near_m {
        return Err(ValidationError::ConstraintViolation {
            fields: vec![
                "walking_speed.finish_zone".to_string(),
                "walking_speed.start_zone".to_string(),
            ],
            message: "finish line must be closer to the sensor than the start line".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suite_is_valid() {
        let config = TestSuiteConfig::default();
        assert!(validate_test_suite(&config).is_ok());
    }

    #[test]
    fn test_invalid_window() {
        let mut config = DetectorConfig::default();
        config.stability_window_frames = 1;
        assert!(validate_detector_config(&config).is_err());
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut config = DetectorConfig::default();
        config.motion_threshold_m = 0.0;
        assert!(validate_detector_config(&config).is_err());

        let mut config = DetectorConfig::default();
        config.phase_timeout_frames = Some(0);
        assert!(validate_detector_config(&config).is_err());

        let mut config = DetectorConfig::default();
        config.extremum_confirm_frames = 0;
        assert!(validate_detector_config(&config).is_err());
    }

    #[test]
    fn test_swapped_walking_zones_rejected() {
        let mut config = TestSuiteConfig::default();
        config.walking_speed.finish_zone = DepthZone::new(6.8, 7.0);
        assert!(validate_test_suite(&config).is_err());
    }

    #[test]
    fn test_depth_zone() {
        let zone = DepthZone::new(3.9, 4.4);
        assert!(zone.contains(4.0));
        assert!(!zone.contains(4.5));
        assert!((zone.centre() - 4.15).abs() < 1e-6);
    }

    #[test]
    fn test_protocol_defaults() {
        let suite = TestSuiteConfig::default();
        assert_eq!(suite.forward_bend.detector.stability_window_frames, 15);
        assert_eq!(suite.up_and_go.detector.stability_window_frames, 20);
        assert!(!suite.up_and_go.detector.require_stability_to_initiate);
        assert_eq!(suite.walking_speed.detector.smoothing_window_frames, Some(10));
    }

    #[test]
    fn test_config_serialization() {
        let config = TestSuiteConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: TestSuiteConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }
}
