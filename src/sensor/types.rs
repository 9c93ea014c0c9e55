// src/sensor/types.rs
//! Core types for body-tracking sensor abstraction

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tracked anatomical landmark reported by the body-tracking sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointId {
    /// Every joint in sensor order
    pub const ALL: [JointId; 25] = [
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
        JointId::KneeLeft,
        JointId::AnkleLeft,
        JointId::FootLeft,
        JointId::HipRight,
        JointId::KneeRight,
        JointId::AnkleRight,
        JointId::FootRight,
        JointId::SpineShoulder,
        JointId::HandTipLeft,
        JointId::ThumbLeft,
        JointId::HandTipRight,
        JointId::ThumbRight,
    ];

    /// Human readable label used in overlays and logs
    pub fn label(&self) -> &'static str {
        match self {
            JointId::SpineBase => "Base Spine",
            JointId::SpineMid => "Mid Spine",
            JointId::Neck => "Neck",
            JointId::Head => "Head",
            JointId::ShoulderLeft => "Left Shoulder",
            JointId::ElbowLeft => "Left Elbow",
            JointId::WristLeft => "Left Wrist",
            JointId::HandLeft => "Left Hand",
            JointId::ShoulderRight => "Right Shoulder",
            JointId::ElbowRight => "Right Elbow",
            JointId::WristRight => "Right Wrist",
            JointId::HandRight => "Right Hand",
            JointId::HipLeft => "Left Hip",
            JointId::KneeLeft => "Left Knee",
            JointId::AnkleLeft => "Left Ankle",
            JointId::FootLeft => "Left Foot",
            JointId::HipRight => "Right Hip",
            JointId::KneeRight => "Right Knee",
            JointId::AnkleRight => "Right Ankle",
            JointId::FootRight => "Right Foot",
            JointId::SpineShoulder => "Shoulder Spine",
            JointId::HandTipLeft => "Left Hand Tip",
            JointId::ThumbLeft => "Left Thumb",
            JointId::HandTipRight => "Right Hand Tip",
            JointId::ThumbRight => "Right Thumb",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coordinate axis in sensor camera space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Lateral
    X,
    /// Vertical
    Y,
    /// Depth (distance from the sensor)
    Z,
}

/// Position in sensor camera space, metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along one axis
    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Linear interpolation towards `other`, `t` in [0, 1]
    pub fn lerp(&self, other: &Point3, t: f32) -> Point3 {
        Point3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

/// Single tracked joint position at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub position: Point3,
    pub tracked: bool,
    pub frame_index: u64,
    pub timestamp_nanos: u64,
}

impl JointSample {
    /// Tracked sample at the given frame
    pub fn tracked(position: Point3, frame_index: u64, timestamp_nanos: u64) -> Self {
        Self {
            position,
            tracked: true,
            frame_index,
            timestamp_nanos,
        }
    }

    /// Sample the sensor reported but could not track this frame
    pub fn untracked(frame_index: u64, timestamp_nanos: u64) -> Self {
        Self {
            position: Point3::default(),
            tracked: false,
            frame_index,
            timestamp_nanos,
        }
    }
}

/// Joint samples of one skeleton for one frame
pub type JointMap = HashMap<JointId, JointSample>;

/// One tracked (or lost) skeleton within a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub tracking_id: u64,
    pub is_tracked: bool,
    pub joints: JointMap,
}

/// All skeletons delivered by the sensor for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonFrame {
    pub sequence: u64,
    pub timestamp_nanos: u64,
    pub bodies: Vec<Body>,
}

impl SkeletonFrame {
    /// Frame with no bodies
    pub fn empty(sequence: u64, timestamp_nanos: u64) -> Self {
        Self {
            sequence,
            timestamp_nanos,
            bodies: Vec::new(),
        }
    }

    /// First body the sensor reports as tracked
    pub fn first_tracked_body(&self) -> Option<&Body> {
        self.bodies.iter().find(|body| body.is_tracked)
    }
}

/// Sensor information and capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    pub version: String,
    pub serial_number: String,
    pub capabilities: SourceCapabilities,
}

/// Sensor capability flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCapabilities {
    pub max_bodies: usize,
    pub joint_count: usize,
    pub nominal_frame_rate_hz: u32,
    pub reports_depth: bool,
}

/// Sensor backends understood by the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Simulator,
    Kinect,
}

impl Default for SourceCapabilities {
    fn default() -> Self {
        Self {
            max_bodies: 6,
            joint_count: JointId::ALL.len(),
            nominal_frame_rate_hz: 30,
            reports_depth: true,
        }
    }
}
