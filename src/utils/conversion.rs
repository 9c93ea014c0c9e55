//! Unit conversion for reporting
//!
//! Detection runs entirely in metres. Conversion to the report unit only
//! happens here, at the reporting boundary.

use crate::config::constants::reporting::CENTIMETRES_PER_METRE;
use serde::{Deserialize, Serialize};

/// Unit used for length metrics in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportUnit {
    Metres,
    Centimetres,
}

impl ReportUnit {
    /// Column suffix used in CSV headers
    pub fn symbol(&self) -> &'static str {
        match self {
            ReportUnit::Metres => "m",
            ReportUnit::Centimetres => "cm",
        }
    }

    /// Convert a length in metres to this unit
    pub fn from_metres(&self, metres: f64) -> f64 {
        match self {
            ReportUnit::Metres => metres,
            ReportUnit::Centimetres => metres_to_centimetres(metres),
        }
    }
}

impl Default for ReportUnit {
    fn default() -> Self {
        ReportUnit::Centimetres
    }
}

pub fn metres_to_centimetres(metres: f64) -> f64 {
    metres * CENTIMETRES_PER_METRE
}

/// Format a value with a fixed number of decimals, negative zero printed as zero
pub fn format_decimal(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    if formatted.starts_with('-') && formatted[1..].chars().all(|c| c == '0' || c == '.') {
        formatted[1..].to_string()
    } else {
        formatted
    }
}
