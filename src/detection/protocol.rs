// src/detection/protocol.rs
//! Test protocol abstraction
//!
//! A protocol supplies the geometric predicates and the distance metric that
//! drive the generic phase machine in [`MotionPhaseDetector`]. Thresholds come
//! from the detector's [`DetectorConfig`], passed in through [`FrameContext`].
//!
//! [`MotionPhaseDetector`]: crate::detection::MotionPhaseDetector

use crate::config::detector_config::{DetectorConfig, TestSuiteConfig};
use crate::detection::baseline::{Baselines, ExtremumTracker};
use crate::detection::protocols::{
    ForwardBendProtocol, FunctionalReachProtocol, UpAndGoProtocol, WalkingSpeedProtocol,
};
use crate::detection::result::Metric;
use crate::sensor::types::{JointId, Point3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Clinical tests the detector can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    FunctionalReach,
    ForwardBend,
    UpAndGo,
    WalkingSpeed,
}

impl TestKind {
    pub const ALL: [TestKind; 4] = [
        TestKind::FunctionalReach,
        TestKind::ForwardBend,
        TestKind::UpAndGo,
        TestKind::WalkingSpeed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TestKind::FunctionalReach => "Functional Reach Test",
            TestKind::ForwardBend => "Seated Forward Bend Test",
            TestKind::UpAndGo => "Timed Up and Go Test",
            TestKind::WalkingSpeed => "Walking Speed Test",
        }
    }

    /// Default CSV file name for this test's results
    pub fn results_file(&self) -> &'static str {
        match self {
            TestKind::FunctionalReach => "Functional_Reach_Test_Results.csv",
            TestKind::ForwardBend => "Seated_Forward_Bend_Test_Results.csv",
            TestKind::UpAndGo => "TUG_Test_Results.csv",
            TestKind::WalkingSpeed => "Walking_Speed_Test_Results.csv",
        }
    }

    /// Detector configuration of this test within the suite
    pub fn detector_config<'a>(&self, suite: &'a TestSuiteConfig) -> &'a DetectorConfig {
        match self {
            TestKind::FunctionalReach => &suite.functional_reach.detector,
            TestKind::ForwardBend => &suite.forward_bend.detector,
            TestKind::UpAndGo => &suite.up_and_go.detector,
            TestKind::WalkingSpeed => &suite.walking_speed.detector,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "frt" | "functional_reach" => Ok(TestKind::FunctionalReach),
            "sfbt" | "forward_bend" => Ok(TestKind::ForwardBend),
            "tug" | "up_and_go" => Ok(TestKind::UpAndGo),
            "wst" | "walking_speed" => Ok(TestKind::WalkingSpeed),
            other => Err(format!("unknown test '{}'", other)),
        }
    }
}

/// Everything a predicate may look at for the current frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub positions: &'a HashMap<JointId, Point3>,
    pub baselines: &'a Baselines,
    pub config: &'a DetectorConfig,
    /// Every stability window is full and within threshold
    pub stable: bool,
    pub frame_index: u64,
    pub timestamp_nanos: u64,
}

impl<'a> FrameContext<'a> {
    pub fn position(&self, joint: JointId) -> Option<Point3> {
        self.positions.get(&joint).copied()
    }

    /// Position captured on entering `Ready`
    pub fn ready_baseline(&self, joint: JointId) -> Option<Point3> {
        self.baselines.ready.as_ref()?.position(joint)
    }

    /// Position captured on entering `MotionInitiated`
    pub fn motion_baseline(&self, joint: JointId) -> Option<Point3> {
        self.baselines.motion.as_ref()?.position(joint)
    }

    /// Signed depth decrease of `joint` since the motion baseline
    pub fn depth_gain(&self, joint: JointId) -> Option<f32> {
        Some(self.motion_baseline(joint)?.z - self.position(joint)?.z)
    }

    /// Vertical distance between two joints is within `tolerance`
    pub fn level(&self, a: JointId, b: JointId, tolerance: f32) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(a), Some(b)) => (a.y - b.y).abs() <= tolerance,
            _ => false,
        }
    }
}

/// Data available when a session completes
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub tracker: &'a ExtremumTracker,
    pub baselines: &'a Baselines,
    pub completed_at_nanos: u64,
}

impl<'a> SummaryContext<'a> {
    /// Seconds from `MotionInitiated` to `to_nanos`
    pub fn seconds_since_motion(&self, to_nanos: u64) -> f64 {
        let start = self
            .baselines
            .motion
            .as_ref()
            .map(|b| b.timestamp_nanos())
            .unwrap_or(to_nanos);
        crate::utils::time::elapsed_seconds(start, to_nanos)
    }
}

/// Predicate set for one clinical test
pub trait TestProtocol: Send + fmt::Debug {
    fn kind(&self) -> TestKind;

    /// Joints that must be tracked for a frame to count
    fn required_joints(&self) -> &[JointId];

    /// Joints whose vertical position feeds a stability window
    fn stability_joints(&self) -> &[JointId];

    /// `AwaitingStability -> Ready`, checked only while stable
    fn ready(&self, ctx: &FrameContext<'_>) -> bool;

    /// `Ready -> MotionInitiated`
    fn initiated(&self, ctx: &FrameContext<'_>) -> bool;

    /// `MotionInitiated -> ExtremumTracking`
    fn motion_started(&self, ctx: &FrameContext<'_>) -> bool;

    /// One signed distance per tracked channel, positive in the expected direction
    fn distances(&self, ctx: &FrameContext<'_>) -> Vec<f32>;

    /// `ExtremumTracking -> Returning`
    fn extremum_reached(&self, ctx: &FrameContext<'_>, tracker: &ExtremumTracker) -> bool {
        tracker.below_max_streak() >= ctx.config.extremum_confirm_frames
    }

    /// `Returning -> Completed`
    fn returned(&self, ctx: &FrameContext<'_>, distances: &[f32]) -> bool {
        distances
            .iter()
            .all(|d| *d <= ctx.config.returned_tolerance_m)
    }

    /// Metrics of a completed session
    fn summarize(&self, summary: &SummaryContext<'_>) -> Vec<Metric>;
}

/// Build the protocol for `kind` from the suite configuration
pub fn build_protocol(kind: TestKind, suite: &TestSuiteConfig) -> Box<dyn TestProtocol> {
    match kind {
        TestKind::FunctionalReach => Box::new(FunctionalReachProtocol::new(&suite.functional_reach)),
        TestKind::ForwardBend => Box::new(ForwardBendProtocol::new()),
        TestKind::UpAndGo => Box::new(UpAndGoProtocol::new(&suite.up_and_go)),
        TestKind::WalkingSpeed => Box::new(WalkingSpeedProtocol::new(&suite.walking_speed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("tug".parse::<TestKind>().unwrap(), TestKind::UpAndGo);
        assert_eq!("Forward-Bend".parse::<TestKind>().unwrap(), TestKind::ForwardBend);
        assert!("sprint".parse::<TestKind>().is_err());
    }

    #[test]
    fn test_factory_matches_kind() {
        let suite = TestSuiteConfig::default();
        for kind in TestKind::ALL {
            let protocol = build_protocol(kind, &suite);
            assert_eq!(protocol.kind(), kind);
            assert!(!protocol.required_joints().is_empty());
            for joint in protocol.stability_joints() {
                assert!(protocol.required_joints().contains(joint));
            }
        }
    }

    #[test]
    fn test_results_files_are_distinct() {
        let mut files: Vec<_> = TestKind::ALL.iter().map(|k| k.results_file()).collect();
        files.sort();
        files.dedup();
        assert_eq!(files.len(), 4);
    }
}
