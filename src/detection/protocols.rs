// src/detection/protocols.rs
//! Predicate sets of the four clinical tests

use crate::config::detector_config::{
    DepthZone, FunctionalReachConfig, UpAndGoConfig, WalkingSpeedConfig,
};
use crate::detection::baseline::ExtremumTracker;
use crate::detection::protocol::{FrameContext, SummaryContext, TestKind, TestProtocol};
use crate::detection::result::Metric;
use crate::sensor::types::JointId;

const REACH_JOINTS: [JointId; 4] = [
    JointId::HandRight,
    JointId::HandLeft,
    JointId::ElbowRight,
    JointId::ElbowLeft,
];

/// Standing reach: arms hang in line with the elbows, are raised, then reach forward
#[derive(Debug, Clone)]
pub struct FunctionalReachProtocol {
    alignment_tolerance_m: f32,
    raise_margin_m: f32,
}

const REACH_SIDES: [(JointId, JointId); 2] = [
    (JointId::HandRight, JointId::ElbowRight),
    (JointId::HandLeft, JointId::ElbowLeft),
];

impl FunctionalReachProtocol {
    pub fn new(config: &FunctionalReachConfig) -> Self {
        Self {
            alignment_tolerance_m: config.arm_alignment_tolerance_m,
            raise_margin_m: config.raise_margin_m,
        }
    }

    /// Hand no more than the raise margin below its elbow
    fn hand_raised(&self, ctx: &FrameContext<'_>, hand: JointId, elbow: JointId) -> bool {
        match (ctx.position(hand), ctx.position(elbow)) {
            (Some(hand), Some(elbow)) => elbow.y - hand.y < self.raise_margin_m,
            _ => false,
        }
    }

    fn hand_in_line(&self, ctx: &FrameContext<'_>, hand: JointId, elbow: JointId) -> bool {
        match (ctx.position(hand), ctx.position(elbow)) {
            (Some(hand), Some(elbow)) => (hand.x - elbow.x).abs() <= self.alignment_tolerance_m,
            _ => false,
        }
    }

    fn hand_reaching(ctx: &FrameContext<'_>, hand: JointId) -> bool {
        let (Some(current), Some(base)) = (ctx.position(hand), ctx.motion_baseline(hand)) else {
            return false;
        };
        let lateral = ctx.config.lateral_tolerance_m;
        base.z - current.z > ctx.config.motion_threshold_m
            && (current.x - base.x).abs() <= lateral
            && (current.y - base.y).abs() <= lateral
    }
}

impl Default for FunctionalReachProtocol {
    fn default() -> Self {
        Self::new(&FunctionalReachConfig::default())
    }
}

impl TestProtocol for FunctionalReachProtocol {
    fn kind(&self) -> TestKind {
        TestKind::FunctionalReach
    }

    fn required_joints(&self) -> &[JointId] {
        &REACH_JOINTS
    }

    fn stability_joints(&self) -> &[JointId] {
        &REACH_JOINTS
    }

    // arms hanging in line with the elbows, not yet raised
    fn ready(&self, ctx: &FrameContext<'_>) -> bool {
        REACH_SIDES.iter().all(|(hand, elbow)| {
            self.hand_in_line(ctx, *hand, *elbow) && !self.hand_raised(ctx, *hand, *elbow)
        })
    }

    fn initiated(&self, ctx: &FrameContext<'_>) -> bool {
        REACH_SIDES
            .iter()
            .all(|(hand, elbow)| self.hand_raised(ctx, *hand, *elbow))
    }

    fn motion_started(&self, ctx: &FrameContext<'_>) -> bool {
        Self::hand_reaching(ctx, JointId::HandRight) && Self::hand_reaching(ctx, JointId::HandLeft)
    }

    fn distances(&self, ctx: &FrameContext<'_>) -> Vec<f32> {
        [JointId::HandRight, JointId::HandLeft]
            .iter()
            .map(|hand| ctx.depth_gain(*hand).unwrap_or(0.0))
            .collect()
    }

    fn summarize(&self, summary: &SummaryContext<'_>) -> Vec<Metric> {
        let maxima = summary.tracker.maxima();
        let channel = |i: usize| maxima.get(i).copied().unwrap_or(0.0) as f64;
        vec![
            Metric::length("Right Hand", channel(0)),
            Metric::length("Left Hand", channel(1)),
        ]
    }
}

const BEND_REQUIRED: [JointId; 4] = [
    JointId::HandLeft,
    JointId::ElbowLeft,
    JointId::SpineMid,
    JointId::SpineBase,
];
const BEND_STABILITY: [JointId; 3] = [JointId::HandLeft, JointId::SpineMid, JointId::SpineBase];

/// Seated bend forward from raised arms
#[derive(Debug, Default, Clone)]
pub struct ForwardBendProtocol;

impl ForwardBendProtocol {
    pub fn new() -> Self {
        Self
    }
}

impl TestProtocol for ForwardBendProtocol {
    fn kind(&self) -> TestKind {
        TestKind::ForwardBend
    }

    fn required_joints(&self) -> &[JointId] {
        &BEND_REQUIRED
    }

    fn stability_joints(&self) -> &[JointId] {
        &BEND_STABILITY
    }

    // seated and still is enough
    fn ready(&self, _ctx: &FrameContext<'_>) -> bool {
        true
    }

    fn initiated(&self, ctx: &FrameContext<'_>) -> bool {
        ctx.level(JointId::ElbowLeft, JointId::HandLeft, ctx.config.level_tolerance_m)
    }

    fn motion_started(&self, ctx: &FrameContext<'_>) -> bool {
        let (Some(hand), Some(elbow), Some(raised_hand), Some(raised_elbow)) = (
            ctx.position(JointId::HandLeft),
            ctx.position(JointId::ElbowLeft),
            ctx.motion_baseline(JointId::HandLeft),
            ctx.motion_baseline(JointId::ElbowLeft),
        ) else {
            return false;
        };
        // either direction starts tracking; bending backwards ends as an invalid session
        (hand.z - raised_hand.z).abs() > ctx.config.motion_threshold_m
            && (elbow.x - raised_elbow.x).abs() <= ctx.config.lateral_tolerance_m
    }

    fn distances(&self, ctx: &FrameContext<'_>) -> Vec<f32> {
        vec![ctx.depth_gain(JointId::HandLeft).unwrap_or(0.0)]
    }

    fn summarize(&self, summary: &SummaryContext<'_>) -> Vec<Metric> {
        vec![Metric::length("Reach", summary.tracker.peak() as f64)]
    }
}

const TUG_REQUIRED: [JointId; 5] = [
    JointId::SpineMid,
    JointId::HipLeft,
    JointId::HipRight,
    JointId::KneeLeft,
    JointId::KneeRight,
];
const TUG_STABILITY: [JointId; 1] = [JointId::SpineMid];

/// Stand up from the chair, walk to the target, come back and sit down
#[derive(Debug, Clone)]
pub struct UpAndGoProtocol {
    seated_zone: DepthZone,
    return_zone: DepthZone,
    target_zone: DepthZone,
    return_leg_tolerance_m: f32,
}

impl UpAndGoProtocol {
    pub fn new(config: &UpAndGoConfig) -> Self {
        Self {
            seated_zone: config.seated_zone,
            return_zone: config.return_zone,
            target_zone: config.target_zone,
            return_leg_tolerance_m: config.return_leg_tolerance_m,
        }
    }

    fn hips_level_with_knees(ctx: &FrameContext<'_>, tolerance: f32) -> bool {
        ctx.level(JointId::HipLeft, JointId::KneeLeft, tolerance)
            && ctx.level(JointId::HipRight, JointId::KneeRight, tolerance)
    }

    fn knees_under_hips(ctx: &FrameContext<'_>, tolerance: f32) -> bool {
        [(JointId::HipLeft, JointId::KneeLeft), (JointId::HipRight, JointId::KneeRight)]
            .iter()
            .all(|(hip, knee)| match (ctx.position(*hip), ctx.position(*knee)) {
                (Some(hip), Some(knee)) => (hip.x - knee.x).abs() <= tolerance,
                _ => false,
            })
    }
}

impl TestProtocol for UpAndGoProtocol {
    fn kind(&self) -> TestKind {
        TestKind::UpAndGo
    }

    fn required_joints(&self) -> &[JointId] {
        &TUG_REQUIRED
    }

    fn stability_joints(&self) -> &[JointId] {
        &TUG_STABILITY
    }

    fn ready(&self, ctx: &FrameContext<'_>) -> bool {
        let Some(spine) = ctx.position(JointId::SpineMid) else {
            return false;
        };
        self.seated_zone.contains(spine.z)
            && Self::hips_level_with_knees(ctx, ctx.config.level_tolerance_m)
    }

    fn initiated(&self, ctx: &FrameContext<'_>) -> bool {
        let (Some(spine), Some(seated)) = (
            ctx.position(JointId::SpineMid),
            ctx.ready_baseline(JointId::SpineMid),
        ) else {
            return false;
        };
        spine.y - seated.y > ctx.config.rise_threshold_m
            && Self::knees_under_hips(ctx, ctx.config.level_tolerance_m)
    }

    fn motion_started(&self, ctx: &FrameContext<'_>) -> bool {
        ctx.depth_gain(JointId::SpineMid)
            .map(|gain| gain > ctx.config.motion_threshold_m)
            .unwrap_or(false)
    }

    fn distances(&self, ctx: &FrameContext<'_>) -> Vec<f32> {
        vec![ctx.depth_gain(JointId::SpineMid).unwrap_or(0.0)]
    }

    /// Turning around only counts once the target zone was reached
    fn extremum_reached(&self, ctx: &FrameContext<'_>, tracker: &ExtremumTracker) -> bool {
        let Some(start) = ctx.motion_baseline(JointId::SpineMid) else {
            return false;
        };
        let target_reached = tracker.peak() >= start.z - self.target_zone.far_m;
        target_reached && tracker.below_max_streak() >= ctx.config.extremum_confirm_frames
    }

    fn returned(&self, ctx: &FrameContext<'_>, _distances: &[f32]) -> bool {
        let Some(spine) = ctx.position(JointId::SpineMid) else {
            return false;
        };
        self.return_zone.contains(spine.z)
            && Self::hips_level_with_knees(ctx, self.return_leg_tolerance_m)
    }

    fn summarize(&self, summary: &SummaryContext<'_>) -> Vec<Metric> {
        vec![
            Metric::duration("Time", summary.seconds_since_motion(summary.completed_at_nanos)),
            Metric::length("Distance", summary.tracker.peak() as f64),
        ]
    }
}

const WALK_JOINTS: [JointId; 1] = [JointId::SpineMid];

/// Timed walk from the start line towards the sensor
#[derive(Debug, Clone)]
pub struct WalkingSpeedProtocol {
    start_zone: DepthZone,
    finish_zone: DepthZone,
}

impl WalkingSpeedProtocol {
    pub fn new(config: &WalkingSpeedConfig) -> Self {
        Self {
            start_zone: config.start_zone,
            finish_zone: config.finish_zone,
        }
    }

    fn depth(ctx: &FrameContext<'_>) -> Option<f32> {
        ctx.position(JointId::SpineMid).map(|p| p.z)
    }
}

impl TestProtocol for WalkingSpeedProtocol {
    fn kind(&self) -> TestKind {
        TestKind::WalkingSpeed
    }

    fn required_joints(&self) -> &[JointId] {
        &WALK_JOINTS
    }

    fn stability_joints(&self) -> &[JointId] {
        &[]
    }

    fn ready(&self, ctx: &FrameContext<'_>) -> bool {
        Self::depth(ctx)
            .map(|z| z >= self.start_zone.near_m)
            .unwrap_or(false)
    }

    fn initiated(&self, ctx: &FrameContext<'_>) -> bool {
        Self::depth(ctx)
            .map(|z| self.start_zone.contains(z))
            .unwrap_or(false)
    }

    fn motion_started(&self, ctx: &FrameContext<'_>) -> bool {
        ctx.depth_gain(JointId::SpineMid)
            .map(|gain| gain > ctx.config.motion_threshold_m)
            .unwrap_or(false)
    }

    fn distances(&self, ctx: &FrameContext<'_>) -> Vec<f32> {
        vec![ctx.depth_gain(JointId::SpineMid).unwrap_or(0.0)]
    }

    /// Finish line crossed
    fn extremum_reached(&self, ctx: &FrameContext<'_>, _tracker: &ExtremumTracker) -> bool {
        Self::depth(ctx)
            .map(|z| z <= self.finish_zone.far_m)
            .unwrap_or(false)
    }

    fn returned(&self, _ctx: &FrameContext<'_>, _distances: &[f32]) -> bool {
        true
    }

    fn summarize(&self, summary: &SummaryContext<'_>) -> Vec<Metric> {
        let (elapsed, course) = match (&summary.baselines.motion, &summary.baselines.extremum) {
            (Some(start), Some(finish)) => {
                let course = match (
                    start.position(JointId::SpineMid),
                    finish.position(JointId::SpineMid),
                ) {
                    (Some(a), Some(b)) => (a.z - b.z) as f64,
                    _ => 0.0,
                };
                (summary.seconds_since_motion(finish.timestamp_nanos()), course)
            }
            _ => (0.0, 0.0),
        };
        let speed = if elapsed > 0.0 { course / elapsed } else { 0.0 };

        vec![
            Metric::duration("Time", elapsed),
            Metric::length("Distance", course),
            Metric::speed("Speed", speed),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::detector_config::{DetectorConfig, TestSuiteConfig};
    use crate::detection::baseline::{Baseline, Baselines};
    use crate::sensor::types::Point3;
    use std::collections::HashMap;

    fn context<'a>(
        positions: &'a HashMap<JointId, Point3>,
        baselines: &'a Baselines,
        config: &'a DetectorConfig,
    ) -> FrameContext<'a> {
        FrameContext {
            positions,
            baselines,
            config,
            stable: true,
            frame_index: 0,
            timestamp_nanos: 0,
        }
    }

    fn arms(hand_z: f32, hand_y: f32) -> HashMap<JointId, Point3> {
        let mut positions = HashMap::new();
        positions.insert(JointId::HandRight, Point3::new(0.2, hand_y, hand_z));
        positions.insert(JointId::HandLeft, Point3::new(-0.2, hand_y, hand_z));
        positions.insert(JointId::ElbowRight, Point3::new(0.2, 1.2, hand_z + 0.3));
        positions.insert(JointId::ElbowLeft, Point3::new(-0.2, 1.2, hand_z + 0.3));
        positions
    }

    #[test]
    fn test_reach_ready_with_arms_hanging_in_line() {
        let config = TestSuiteConfig::default().functional_reach.detector;
        let baselines = Baselines::default();
        let protocol = FunctionalReachProtocol::default();

        // hands 0.3 m below the elbows, straight down
        let hanging = arms(2.0, 0.9);
        assert!(protocol.ready(&context(&hanging, &baselines, &config)));
        assert!(!protocol.initiated(&context(&hanging, &baselines, &config)));

        // arms already up is not a starting position
        let raised = arms(2.0, 1.2);
        assert!(!protocol.ready(&context(&raised, &baselines, &config)));

        let mut splayed = hanging.clone();
        splayed.insert(JointId::HandLeft, Point3::new(-0.4, 0.9, 2.0));
        assert!(!protocol.ready(&context(&splayed, &baselines, &config)));
    }

    #[test]
    fn test_reach_initiated_once_both_arms_raised() {
        let config = TestSuiteConfig::default().functional_reach.detector;
        let baselines = Baselines::default();
        let protocol = FunctionalReachProtocol::default();

        assert!(protocol.initiated(&context(&arms(2.0, 1.2), &baselines, &config)));
        assert!(protocol.initiated(&context(&arms(2.0, 1.17), &baselines, &config)));
        assert!(!protocol.initiated(&context(&arms(2.0, 1.1), &baselines, &config)));

        let mut one_arm = arms(2.0, 1.2);
        one_arm.insert(JointId::HandRight, Point3::new(0.2, 0.9, 2.0));
        assert!(!protocol.initiated(&context(&one_arm, &baselines, &config)));
    }

    #[test]
    fn test_reach_margins_come_from_config() {
        let config = TestSuiteConfig::default().functional_reach.detector;
        let baselines = Baselines::default();
        let protocol = FunctionalReachProtocol::new(&FunctionalReachConfig {
            raise_margin_m: 0.2,
            ..FunctionalReachConfig::default()
        });

        assert!(protocol.initiated(&context(&arms(2.0, 1.1), &baselines, &config)));
    }

    #[test]
    fn test_reach_motion_needs_both_hands() {
        let config = TestSuiteConfig::default().functional_reach.detector;
        let protocol = FunctionalReachProtocol::default();
        let start = arms(2.0, 1.2);
        let baselines = Baselines {
            motion: Some(Baseline::capture(&start, &REACH_JOINTS, 0, 0)),
            ..Baselines::default()
        };

        let mut one_hand = start.clone();
        one_hand.insert(JointId::HandRight, Point3::new(0.2, 1.2, 1.8));
        assert!(!protocol.motion_started(&context(&one_hand, &baselines, &config)));

        let both = arms(1.8, 1.2);
        let ctx = context(&both, &baselines, &config);
        assert!(protocol.motion_started(&ctx));
        let distances = protocol.distances(&ctx);
        assert!((distances[0] - 0.2).abs() < 1e-6);
        assert!((distances[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_up_and_go_waits_for_target() {
        let suite = TestSuiteConfig::default();
        let config = suite.up_and_go.detector.clone();
        let protocol = UpAndGoProtocol::new(&suite.up_and_go);

        let mut start = HashMap::new();
        start.insert(JointId::SpineMid, Point3::new(0.0, 0.6, 4.0));
        let baselines = Baselines {
            motion: Some(Baseline::capture(&start, &[JointId::SpineMid], 0, 0)),
            ..Baselines::default()
        };
        let ctx = context(&start, &baselines, &config);

        // turned around at 2.0 m, never reached the target zone
        let mut short = ExtremumTracker::new();
        short.update(&[2.0]);
        short.update(&[1.9]);
        assert!(!protocol.extremum_reached(&ctx, &short));

        let mut full = ExtremumTracker::new();
        full.update(&[3.0]);
        full.update(&[2.9]);
        assert!(protocol.extremum_reached(&ctx, &full));
    }

    #[test]
    fn test_walking_finish_line() {
        let suite = TestSuiteConfig::default();
        let config = suite.walking_speed.detector.clone();
        let protocol = WalkingSpeedProtocol::new(&suite.walking_speed);
        let baselines = Baselines::default();
        let tracker = ExtremumTracker::new();

        let mut positions = HashMap::new();
        positions.insert(JointId::SpineMid, Point3::new(0.0, 1.0, 3.0));
        assert!(!protocol.extremum_reached(&context(&positions, &baselines, &config), &tracker));

        positions.insert(JointId::SpineMid, Point3::new(0.0, 1.0, 1.55));
        assert!(protocol.extremum_reached(&context(&positions, &baselines, &config), &tracker));
    }

    #[test]
    fn test_walking_summary() {
        let suite = TestSuiteConfig::default();
        let protocol = WalkingSpeedProtocol::new(&suite.walking_speed);

        let mut start = HashMap::new();
        start.insert(JointId::SpineMid, Point3::new(0.0, 1.0, 6.6));
        let mut finish = HashMap::new();
        finish.insert(JointId::SpineMid, Point3::new(0.0, 1.0, 1.6));

        let baselines = Baselines {
            ready: None,
            motion: Some(Baseline::capture(&start, &WALK_JOINTS, 10, 1_000_000_000)),
            extremum: Some(Baseline::capture(&finish, &WALK_JOINTS, 160, 6_000_000_000)),
        };
        let tracker = ExtremumTracker::new();
        let metrics = protocol.summarize(&SummaryContext {
            tracker: &tracker,
            baselines: &baselines,
            completed_at_nanos: 6_100_000_000,
        });

        assert_eq!(metrics[0].name, "Time");
        assert!((metrics[0].value - 5.0).abs() < 1e-9);
        assert!((metrics[1].value - 5.0).abs() < 1e-5);
        assert!((metrics[2].value - 1.0).abs() < 1e-5);
    }
}
