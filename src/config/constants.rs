// src/config/constants.rs
//! System-wide configuration constants
//!
//! Defaults follow the thresholds the clinical protocols were calibrated with.
//! All distances are metres in sensor camera space.

/// Stability window constants
pub mod stability {
    pub const DEFAULT_WINDOW_FRAMES: usize = 20;
    pub const SEATED_WINDOW_FRAMES: usize = 15;
    pub const ARM_LEVEL_WINDOW_FRAMES: usize = 10;
    pub const MIN_WINDOW_FRAMES: usize = 2;
    pub const MAX_WINDOW_FRAMES: usize = 600;

    pub const DEFAULT_THRESHOLD_M: f32 = 0.02;
    pub const MIN_THRESHOLD_M: f32 = 0.001;
    pub const MAX_THRESHOLD_M: f32 = 0.5;
}

/// Phase detection constants shared by every protocol
pub mod detection {
    pub const DEFAULT_MOTION_THRESHOLD_M: f32 = 0.05;
    pub const DEFAULT_LATERAL_TOLERANCE_M: f32 = 0.05;
    pub const DEFAULT_RETURNED_TOLERANCE_M: f32 = 0.05;
    pub const DEFAULT_LEVEL_TOLERANCE_M: f32 = 0.1;
    pub const DEFAULT_RISE_THRESHOLD_M: f32 = 0.05;
    pub const DEFAULT_EXTREMUM_CONFIRM_FRAMES: u32 = 1;
    pub const MAX_EXTREMUM_CONFIRM_FRAMES: u32 = 30;
    pub const MAX_SMOOTHING_WINDOW_FRAMES: usize = 120;
    pub const MAX_TOLERANCE_M: f32 = 2.0;
}

/// Functional reach test
pub mod functional_reach {
    pub const ARM_ALIGNMENT_TOLERANCE_M: f32 = 0.15;
    pub const RAISE_MARGIN_M: f32 = 0.05;
    pub const LEVEL_TOLERANCE_M: f32 = 0.1;
    pub const MOTION_THRESHOLD_M: f32 = 0.05;
    pub const LATERAL_TOLERANCE_M: f32 = 0.05;
    pub const RETURNED_TOLERANCE_M: f32 = 0.05;
}

/// Seated forward bend test
pub mod forward_bend {
    pub const LEVEL_TOLERANCE_M: f32 = 0.1;
    pub const MOTION_THRESHOLD_M: f32 = 0.05;
    pub const LATERAL_TOLERANCE_M: f32 = 0.2;
    pub const RETURNED_TOLERANCE_M: f32 = 0.3;
}

/// Timed up and go test
pub mod up_and_go {
    pub const SEATED_ZONE_M: (f32, f32) = (3.9, 4.4);
    pub const RETURN_ZONE_M: (f32, f32) = (3.8, 4.2);
    pub const TARGET_ZONE_M: (f32, f32) = (0.9, 1.1);
    pub const LEG_LEVEL_TOLERANCE_M: f32 = 0.1;
    pub const RETURN_LEG_TOLERANCE_M: f32 = 0.2;
    pub const RISE_THRESHOLD_M: f32 = 0.05;
    pub const MOTION_THRESHOLD_M: f32 = 0.5;
}

/// Walking speed test
pub mod walking_speed {
    pub const START_ZONE_M: (f32, f32) = (6.5, 6.7);
    pub const FINISH_ZONE_M: (f32, f32) = (1.5, 1.6);
    pub const SMOOTHING_WINDOW_FRAMES: usize = 10;
    pub const MOTION_THRESHOLD_M: f32 = 0.05;
}

/// Sensor constants
pub mod sensor {
    pub const DEFAULT_FRAME_RATE_HZ: u32 = 30;
    pub const MIN_FRAME_RATE_HZ: u32 = 1;
    pub const MAX_FRAME_RATE_HZ: u32 = 120;
    pub const DEFAULT_OPEN_TIMEOUT_MS: u32 = 5000;
    pub const MAX_BODIES: usize = 6;
}

/// Simulator constants
pub mod simulation {
    pub const DEFAULT_JITTER_M: f32 = 0.002;
    pub const MAX_JITTER_M: f32 = 0.05;
    pub const DEFAULT_DROPOUT_PROBABILITY: f32 = 0.0;
    pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;
}

/// Result reporting constants
pub mod reporting {
    pub const DEFAULT_RESULTS_DIR: &str = ".";
    pub const DEFAULT_DECIMAL_PRECISION: usize = 2;
    pub const MAX_DECIMAL_PRECISION: usize = 9;
    pub const CENTIMETRES_PER_METRE: f64 = 100.0;
}

/// Announcement queue constants
pub mod speech {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
    pub const MAX_QUEUE_CAPACITY: usize = 1024;
}

/// Timing constants
pub mod performance {
    pub const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;
}

/// Configuration file paths
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/motion-assess/config.toml";
    pub const USER_CONFIG_DIR: &str = ".motion-assess";
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "motion-assess.toml";
    pub const ENV_PREFIX: &str = "MOTION_";
}
