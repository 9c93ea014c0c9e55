//! motion-assess: joint-stability and motion-phase detection for clinical
//! mobility tests
//!
//! Skeleton frames from a depth sensor (or the scripted simulator) drive a
//! per-test phase machine that waits for a stable starting posture, captures
//! baselines, follows the subject to the furthest point of the movement and
//! reports the resulting measurements. It features:
//!
//! - Functional reach, seated forward bend, timed up-and-go and walking speed
//!   protocols behind one detector
//! - Scripted skeleton source with seeded jitter for repeatable sessions
//! - TOML configuration with environment overrides and hot reload
//! - CSV result logs and a non-blocking announcement queue
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use motion_assess::config::SystemConfig;
//! use motion_assess::detection::TestKind;
//! use motion_assess::sensor::{script_for, ScriptedSkeletonSource};
//! use motion_assess::session::AssessmentSession;
//! use motion_assess::speech::Announcer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SystemConfig::default();
//!     let script = script_for(TestKind::ForwardBend, &config.tests);
//!     let mut source = ScriptedSkeletonSource::new(script, config.simulator())?;
//!
//!     let mut session =
//!         AssessmentSession::new(TestKind::ForwardBend, &config, Announcer::disabled())?;
//!     if let Some(result) = session.run(&mut source, None).await? {
//!         println!("{:?}", result.metrics);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod detection;
pub mod error;
pub mod reporting;
pub mod sensor;
pub mod session;
pub mod speech;
pub mod utils;

// Re-export commonly used types for convenience
pub use detection::{
    MotionPhaseDetector, PhaseState, PhaseTransitionEvent, ResetReason, SessionResult, TestKind,
};

pub use error::{AssessError, AssessResult};

pub use sensor::{JointId, JointMap, Point3, SkeletonFrame, SkeletonSource};

pub use utils::validation::{ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Joint-stability and motion-phase detection for clinical mobility tests"
            .to_string(),
        tests: TestKind::ALL.iter().map(|kind| kind.label().to_string()).collect(),
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// Supported clinical tests
    pub tests: Vec<String>,
}
