//! Common utility functions for motion-assess
//!
//! - Frame timing helpers
//! - Configuration validation helpers
//! - Unit conversion at the reporting boundary

pub mod time;
pub mod validation;
pub mod conversion;

// Re-export commonly used functions for convenience
pub use time::{elapsed_seconds, frame_period_nanos};

pub use validation::{
    ValidationError,
    ValidationResult,
    validate_range,
    validate_positive_distance,
    validate_zone,
};

pub use conversion::{
    format_decimal,
    metres_to_centimetres,
    ReportUnit,
};
