// src/sensor/script.rs
//! Keyframed motion scripts for the simulator
//!
//! A script starts from a pose and moves linearly to each following pose
//! over a number of frames. The built-in scripts walk a subject through a
//! complete run of each clinical test.

use crate::config::detector_config::TestSuiteConfig;
use crate::detection::protocol::TestKind;
use crate::sensor::types::{JointId, Point3};
use std::collections::HashMap;

/// Full-body joint positions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyPose {
    joints: HashMap<JointId, Point3>,
}

/// (joint, x, y, depth offset) of an upright subject, arms hanging
const STANDING_LAYOUT: [(JointId, f32, f32, f32); 25] = [
    (JointId::SpineBase, 0.0, 0.90, 0.0),
    (JointId::SpineMid, 0.0, 1.15, 0.0),
    (JointId::Neck, 0.0, 1.45, 0.0),
    (JointId::Head, 0.0, 1.60, 0.0),
    (JointId::ShoulderLeft, -0.18, 1.40, 0.0),
    (JointId::ElbowLeft, -0.22, 1.15, 0.0),
    (JointId::WristLeft, -0.24, 0.92, 0.0),
    (JointId::HandLeft, -0.24, 0.85, 0.0),
    (JointId::ShoulderRight, 0.18, 1.40, 0.0),
    (JointId::ElbowRight, 0.22, 1.15, 0.0),
    (JointId::WristRight, 0.24, 0.92, 0.0),
    (JointId::HandRight, 0.24, 0.85, 0.0),
    (JointId::HipLeft, -0.10, 0.90, 0.0),
    (JointId::KneeLeft, -0.10, 0.50, 0.0),
    (JointId::AnkleLeft, -0.10, 0.10, 0.0),
    (JointId::FootLeft, -0.10, 0.05, -0.08),
    (JointId::HipRight, 0.10, 0.90, 0.0),
    (JointId::KneeRight, 0.10, 0.50, 0.0),
    (JointId::AnkleRight, 0.10, 0.10, 0.0),
    (JointId::FootRight, 0.10, 0.05, -0.08),
    (JointId::SpineShoulder, 0.0, 1.40, 0.0),
    (JointId::HandTipLeft, -0.24, 0.78, 0.0),
    (JointId::ThumbLeft, -0.21, 0.83, -0.02),
    (JointId::HandTipRight, 0.24, 0.78, 0.0),
    (JointId::ThumbRight, 0.21, 0.83, -0.02),
];

impl BodyPose {
    /// Upright subject with the spine at `depth_m` from the sensor
    pub fn standing(depth_m: f32) -> Self {
        let joints = STANDING_LAYOUT
            .iter()
            .map(|(joint, x, y, dz)| (*joint, Point3::new(*x, *y, depth_m + dz)))
            .collect();
        Self { joints }
    }

    /// Subject sitting on a chair, hips level with knees
    pub fn seated(depth_m: f32) -> Self {
        let mut pose = Self::standing(depth_m);
        // upper body drops by the thigh length, knees come forward
        pose.shift(
            &HIPS_AND_ABOVE,
            Point3::new(0.0, -0.40, 0.0),
        );
        pose.shift(
            &[JointId::KneeLeft, JointId::KneeRight],
            Point3::new(0.0, 0.0, -0.40),
        );
        pose.shift(
            &[
                JointId::AnkleLeft,
                JointId::FootLeft,
                JointId::AnkleRight,
                JointId::FootRight,
            ],
            Point3::new(0.0, -0.05, -0.40),
        );
        pose
    }

    pub fn get(&self, joint: JointId) -> Option<Point3> {
        self.joints.get(&joint).copied()
    }

    pub fn set(&mut self, joint: JointId, position: Point3) -> &mut Self {
        self.joints.insert(joint, position);
        self
    }

    /// Move `joints` by `delta`
    pub fn shift(&mut self, joints: &[JointId], delta: Point3) -> &mut Self {
        for joint in joints {
            if let Some(p) = self.joints.get_mut(joint) {
                *p = Point3::new(p.x + delta.x, p.y + delta.y, p.z + delta.z);
            }
        }
        self
    }

    /// Move every joint by `delta`
    pub fn translate(&mut self, delta: Point3) -> &mut Self {
        let joints: Vec<JointId> = self.joints.keys().copied().collect();
        self.shift(&joints, delta)
    }

    /// Interpolate joint by joint; joints missing from `other` keep their position
    pub fn lerp(&self, other: &BodyPose, t: f32) -> BodyPose {
        let joints = self
            .joints
            .iter()
            .map(|(joint, from)| {
                let to = other.joints.get(joint).unwrap_or(from);
                (*joint, from.lerp(to, t))
            })
            .collect();
        BodyPose { joints }
    }

    pub fn joints(&self) -> impl Iterator<Item = (&JointId, &Point3)> {
        self.joints.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    target: BodyPose,
    frames: u32,
}

/// Sequence of poses replayed frame by frame
#[derive(Debug, Clone, PartialEq)]
pub struct MotionScript {
    start: BodyPose,
    segments: Vec<Segment>,
}

impl MotionScript {
    pub fn starting_at(pose: BodyPose) -> Self {
        Self {
            start: pose,
            segments: Vec::new(),
        }
    }

    /// Keep the current pose for `frames` frames
    pub fn hold(mut self, frames: u32) -> Self {
        let target = self.last_pose().clone();
        self.segments.push(Segment { target, frames });
        self
    }

    /// Move linearly to `pose`, arriving on the last of `frames` frames
    pub fn move_to(mut self, pose: BodyPose, frames: u32) -> Self {
        self.segments.push(Segment {
            target: pose,
            frames: frames.max(1),
        });
        self
    }

    /// Derive the next pose from the current one and move to it
    pub fn then(self, frames: u32, edit: impl FnOnce(&mut BodyPose)) -> Self {
        let mut pose = self.last_pose().clone();
        edit(&mut pose);
        self.move_to(pose, frames)
    }

    /// Pose at the end of the script so far
    pub fn last_pose(&self) -> &BodyPose {
        self.segments
            .last()
            .map(|s| &s.target)
            .unwrap_or(&self.start)
    }

    /// Total frames, the start pose counts as frame zero
    pub fn frame_count(&self) -> u64 {
        1 + self.segments.iter().map(|s| s.frames as u64).sum::<u64>()
    }

    /// Pose at `frame`, `None` past the end
    pub fn pose_at(&self, frame: u64) -> Option<BodyPose> {
        if frame == 0 {
            return Some(self.start.clone());
        }

        let mut remaining = frame - 1;
        let mut from = &self.start;
        for segment in &self.segments {
            let frames = segment.frames as u64;
            if remaining < frames {
                let t = (remaining + 1) as f32 / frames as f32;
                return Some(from.lerp(&segment.target, t));
            }
            remaining -= frames;
            from = &segment.target;
        }
        None
    }
}

const HANDS: [JointId; 2] = [JointId::HandLeft, JointId::HandRight];
const ARMS: [JointId; 8] = [
    JointId::ElbowLeft,
    JointId::WristLeft,
    JointId::HandLeft,
    JointId::HandTipLeft,
    JointId::ElbowRight,
    JointId::WristRight,
    JointId::HandRight,
    JointId::HandTipRight,
];
const LEFT_ARM: [JointId; 4] = [
    JointId::ElbowLeft,
    JointId::WristLeft,
    JointId::HandLeft,
    JointId::HandTipLeft,
];
const HIPS_AND_ABOVE: [JointId; 19] = [
    JointId::SpineBase,
    JointId::SpineMid,
    JointId::Neck,
    JointId::Head,
    JointId::ShoulderLeft,
    JointId::ElbowLeft,
    JointId::WristLeft,
    JointId::HandLeft,
    JointId::ShoulderRight,
    JointId::ElbowRight,
    JointId::WristRight,
    JointId::HandRight,
    JointId::HipLeft,
    JointId::HipRight,
    JointId::SpineShoulder,
    JointId::HandTipLeft,
    JointId::ThumbLeft,
    JointId::HandTipRight,
    JointId::ThumbRight,
];

/// Script performing one successful run of `kind`
pub fn script_for(kind: TestKind, suite: &TestSuiteConfig) -> MotionScript {
    match kind {
        TestKind::FunctionalReach => functional_reach_script(0.30),
        TestKind::ForwardBend => forward_bend_script(0.35),
        TestKind::UpAndGo => up_and_go_script(suite),
        TestKind::WalkingSpeed => walking_speed_script(suite),
    }
}

/// Standing reach of `reach_m`: arms hang, are raised level, then reach
pub fn functional_reach_script(reach_m: f32) -> MotionScript {
    MotionScript::starting_at(BodyPose::standing(2.0))
        .hold(10)
        .then(15, |pose| {
            // arms forward, hands level with elbows
            pose.shift(&ARMS, Point3::new(0.0, 0.0, -0.25));
            for joint in ARMS {
                if let Some(p) = pose.get(joint) {
                    pose.set(joint, Point3::new(p.x, 1.30, p.z));
                }
            }
            for hand in HANDS {
                if let Some(p) = pose.get(hand) {
                    pose.set(hand, Point3::new(p.x, 1.30, p.z - 0.30));
                }
            }
        })
        .hold(30)
        .then(30, |pose| {
            pose.shift(&HANDS, Point3::new(0.0, 0.0, -reach_m));
        })
        .then(30, |pose| {
            pose.shift(&HANDS, Point3::new(0.0, 0.0, reach_m));
        })
        .hold(15)
}

/// Seated bend forward reaching `reach_m` past the raised-arm position
pub fn forward_bend_script(reach_m: f32) -> MotionScript {
    MotionScript::starting_at(BodyPose::seated(2.5))
        .hold(25)
        .then(15, |pose| {
            for joint in LEFT_ARM {
                if let Some(p) = pose.get(joint) {
                    pose.set(joint, Point3::new(p.x, 1.0, p.z - 0.3));
                }
            }
        })
        .hold(25)
        .then(35, |pose| {
            pose.shift(&LEFT_ARM, Point3::new(0.0, -0.05, -reach_m));
            pose.shift(&[JointId::Neck, JointId::Head], Point3::new(0.0, -0.1, -reach_m * 0.5));
        })
        .then(35, |pose| {
            pose.shift(&LEFT_ARM, Point3::new(0.0, 0.05, reach_m));
            pose.shift(&[JointId::Neck, JointId::Head], Point3::new(0.0, 0.1, reach_m * 0.5));
        })
        .hold(15)
}

/// Stand up, walk to the target zone, come back and sit down
pub fn up_and_go_script(suite: &TestSuiteConfig) -> MotionScript {
    let tug = &suite.up_and_go;
    let chair = tug.seated_zone.centre();
    let target = tug.target_zone.centre();
    let walk = chair - target;

    MotionScript::starting_at(BodyPose::seated(chair))
        .hold(30)
        .move_to(BodyPose::standing(chair), 20)
        .then(90, |pose| {
            pose.translate(Point3::new(0.0, 0.0, -walk));
        })
        .hold(10)
        .then(90, |pose| {
            pose.translate(Point3::new(0.0, 0.0, walk));
        })
        .move_to(BodyPose::seated(chair), 20)
        .hold(15)
}

/// Walk through the start zone up to and past the finish line
pub fn walking_speed_script(suite: &TestSuiteConfig) -> MotionScript {
    let wst = &suite.walking_speed;
    let start = wst.start_zone.far_m + 0.3;
    let end = wst.finish_zone.near_m - 0.5;
    // about 1 m/s at 30 frames per second
    let frames = ((start - end) * 30.0).round() as u32;

    MotionScript::starting_at(BodyPose::standing(start))
        .hold(20)
        .then(frames, |pose| {
            pose.translate(Point3::new(0.0, 0.0, end - start));
        })
        .hold(20)
}

/// Subject that never leaves the seated posture
pub fn idle_script(frames: u32) -> MotionScript {
    MotionScript::starting_at(BodyPose::seated(2.5)).hold(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standing_pose_has_every_joint() {
        let pose = BodyPose::standing(3.0);
        for joint in JointId::ALL {
            assert!(pose.get(joint).is_some(), "missing {}", joint);
        }
        assert_eq!(pose.get(JointId::SpineMid).unwrap().z, 3.0);
    }

    #[test]
    fn test_seated_hips_level_with_knees() {
        let pose = BodyPose::seated(4.15);
        let hip = pose.get(JointId::HipLeft).unwrap();
        let knee = pose.get(JointId::KneeLeft).unwrap();
        assert!((hip.y - knee.y).abs() < 0.01);
        assert!(knee.z < hip.z);
    }

    #[test]
    fn test_script_interpolation() {
        let script = MotionScript::starting_at(BodyPose::standing(4.0))
            .hold(2)
            .then(4, |pose| {
                pose.translate(Point3::new(0.0, 0.0, -2.0));
            });

        assert_eq!(script.frame_count(), 7);
        let z = |frame| script.pose_at(frame).unwrap().get(JointId::SpineMid).unwrap().z;
        assert_eq!(z(0), 4.0);
        assert_eq!(z(2), 4.0);
        assert!((z(3) - 3.5).abs() < 1e-6);
        assert!((z(6) - 2.0).abs() < 1e-6);
        assert!(script.pose_at(7).is_none());
    }

    #[test]
    fn test_builtin_scripts_are_finite() {
        let suite = TestSuiteConfig::default();
        for kind in TestKind::ALL {
            let script = script_for(kind, &suite);
            assert!(script.frame_count() > 50);
            assert!(script.pose_at(script.frame_count() - 1).is_some());
        }
    }
}
