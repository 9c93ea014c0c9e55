// src/detection/baseline.rs
//! Baseline snapshots and extremum tracking

use crate::sensor::types::{JointId, Point3};
use std::collections::HashMap;

/// Joint positions captured at a phase boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    positions: HashMap<JointId, Point3>,
    frame_index: u64,
    timestamp_nanos: u64,
}

impl Baseline {
    /// Snapshot `joints` out of the current (possibly smoothed) positions
    pub fn capture(
        positions: &HashMap<JointId, Point3>,
        joints: &[JointId],
        frame_index: u64,
        timestamp_nanos: u64,
    ) -> Self {
        let positions = joints
            .iter()
            .filter_map(|joint| positions.get(joint).map(|p| (*joint, *p)))
            .collect();
        Self {
            positions,
            frame_index,
            timestamp_nanos,
        }
    }

    pub fn position(&self, joint: JointId) -> Option<Point3> {
        self.positions.get(&joint).copied()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn timestamp_nanos(&self) -> u64 {
        self.timestamp_nanos
    }

    pub fn joints(&self) -> impl Iterator<Item = (&JointId, &Point3)> {
        self.positions.iter()
    }
}

/// Snapshots taken during one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baselines {
    /// Captured on entering `Ready`
    pub ready: Option<Baseline>,
    /// Captured on entering `MotionInitiated`
    pub motion: Option<Baseline>,
    /// Captured when the extremum is confirmed
    pub extremum: Option<Baseline>,
}

impl Baselines {
    pub fn clear(&mut self) {
        self.ready = None;
        self.motion = None;
        self.extremum = None;
    }
}

/// Running per-channel maxima of the distance metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtremumTracker {
    maxima: Vec<f32>,
    below_max_streak: u32,
    frames_tracked: u64,
}

impl ExtremumTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame of distances into the maxima.
    ///
    /// Returns the number of consecutive frames (including this one) in
    /// which every channel sat strictly below its maximum.
    pub fn update(&mut self, distances: &[f32]) -> u32 {
        if self.maxima.len() < distances.len() {
            self.maxima.resize(distances.len(), 0.0);
        }

        let all_below = !distances.is_empty()
            && distances
                .iter()
                .zip(self.maxima.iter())
                .all(|(distance, max)| distance < max);

        for (max, distance) in self.maxima.iter_mut().zip(distances) {
            if *distance > *max {
                *max = *distance;
            }
        }

        self.frames_tracked += 1;
        if all_below {
            self.below_max_streak += 1;
        } else {
            self.below_max_streak = 0;
        }
        self.below_max_streak
    }

    /// Per-channel maxima, zero for channels that never moved forward
    pub fn maxima(&self) -> &[f32] {
        &self.maxima
    }

    /// Largest maximum across all channels
    pub fn peak(&self) -> f32 {
        self.maxima.iter().copied().fold(0.0, f32::max)
    }

    /// At least one channel exceeded zero
    pub fn has_moved(&self) -> bool {
        self.peak() > 0.0
    }

    pub fn below_max_streak(&self) -> u32 {
        self.below_max_streak
    }

    pub fn frames_tracked(&self) -> u64 {
        self.frames_tracked
    }

    pub fn reset(&mut self) {
        self.maxima.clear();
        self.below_max_streak = 0;
        self.frames_tracked = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_selected_joints() {
        let mut positions = HashMap::new();
        positions.insert(JointId::HandLeft, Point3::new(0.1, 0.2, 0.5));
        positions.insert(JointId::Head, Point3::new(0.0, 0.8, 2.0));

        let baseline = Baseline::capture(&positions, &[JointId::HandLeft, JointId::ElbowLeft], 7, 0);
        assert_eq!(baseline.position(JointId::HandLeft), Some(Point3::new(0.1, 0.2, 0.5)));
        assert_eq!(baseline.position(JointId::Head), None);
        assert_eq!(baseline.position(JointId::ElbowLeft), None);
        assert_eq!(baseline.frame_index(), 7);
    }

    #[test]
    fn test_tracker_is_monotone() {
        let mut tracker = ExtremumTracker::new();
        let mut previous = 0.0;
        for d in [0.05, 0.2, 0.4, 0.2, 0.1, 0.3] {
            tracker.update(&[d]);
            assert!(tracker.peak() >= previous);
            previous = tracker.peak();
        }
        assert_eq!(tracker.peak(), 0.4);
    }

    #[test]
    fn test_below_max_streak() {
        let mut tracker = ExtremumTracker::new();
        assert_eq!(tracker.update(&[0.2, 0.1]), 0);
        assert_eq!(tracker.update(&[0.1, 0.05]), 1);
        assert_eq!(tracker.update(&[0.1, 0.05]), 2);
        // one channel climbing breaks the streak
        assert_eq!(tracker.update(&[0.1, 0.3]), 0);
        assert_eq!(tracker.maxima(), &[0.2, 0.3]);
    }

    #[test]
    fn test_negative_distances_never_move() {
        let mut tracker = ExtremumTracker::new();
        tracker.update(&[-0.1]);
        tracker.update(&[-0.3]);
        assert!(!tracker.has_moved());
        tracker.reset();
        assert_eq!(tracker.frames_tracked(), 0);
    }
}
