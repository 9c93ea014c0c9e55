// src/detection/detector.rs
//! Motion-phase detector
//!
//! Single-threaded state machine fed one [`JointMap`] per frame. Untracked or
//! missing required joints make the frame a no-op.

use crate::config::detector_config::{DetectorConfig, TestSuiteConfig};
use crate::detection::baseline::{Baseline, Baselines, ExtremumTracker};
use crate::detection::phase::{PhaseState, PhaseTransitionEvent, ResetReason};
use crate::detection::protocol::{
    build_protocol, FrameContext, SummaryContext, TestKind, TestProtocol,
};
use crate::detection::result::SessionResult;
use crate::detection::stability::{is_stable, JointSmoother, StabilityWindow};
use crate::sensor::types::{JointId, JointMap, Point3};
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

pub struct MotionPhaseDetector {
    protocol: Box<dyn TestProtocol>,
    config: DetectorConfig,
    state: PhaseState,
    windows: Vec<(JointId, StabilityWindow)>,
    smoother: Option<JointSmoother>,
    baselines: Baselines,
    tracker: ExtremumTracker,
    positions: HashMap<JointId, Point3>,
    current_distances: Vec<f32>,
    frames_in_phase: u64,
    frames_observed: u64,
}

impl MotionPhaseDetector {
    pub fn new(protocol: Box<dyn TestProtocol>, config: DetectorConfig) -> Self {
        let windows = protocol
            .stability_joints()
            .iter()
            .map(|joint| (*joint, StabilityWindow::new(config.stability_window_frames)))
            .collect();
        let smoother = config.smoothing_window_frames.map(JointSmoother::new);

        Self {
            protocol,
            config,
            state: PhaseState::AwaitingStability,
            windows,
            smoother,
            baselines: Baselines::default(),
            tracker: ExtremumTracker::new(),
            positions: HashMap::new(),
            current_distances: Vec::new(),
            frames_in_phase: 0,
            frames_observed: 0,
        }
    }

    /// Detector for one test of the suite, using that test's thresholds
    pub fn for_test(kind: TestKind, suite: &TestSuiteConfig) -> Self {
        Self::new(build_protocol(kind, suite), kind.detector_config(suite).clone())
    }

    /// Feed one frame of joints; returns the transition it caused, if any
    pub fn observe(&mut self, joints: &JointMap) -> Option<PhaseTransitionEvent> {
        if self.state.is_terminal() {
            return None;
        }

        let (frame_index, timestamp_nanos) = self.collect_positions(joints)?;
        self.frames_observed += 1;
        self.frames_in_phase += 1;

        for (joint, window) in self.windows.iter_mut() {
            if let Some(position) = self.positions.get(joint) {
                window.push(position.y);
            }
        }
        let stable = self
            .windows
            .iter()
            .all(|(_, window)| is_stable(window, self.config.stability_threshold_m));

        let event = self.step(stable, frame_index, timestamp_nanos);
        if event.is_some() {
            return event;
        }

        self.check_phase_timeout(frame_index)
    }

    /// Clear windows, baselines and maxima and go back to `AwaitingStability`
    pub fn reset(&mut self) {
        for (_, window) in self.windows.iter_mut() {
            window.clear();
        }
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
        self.baselines.clear();
        self.tracker.reset();
        self.positions.clear();
        self.current_distances.clear();
        self.state = PhaseState::AwaitingStability;
        self.frames_in_phase = 0;
    }

    /// Reset and describe it as an event for logging
    pub fn reset_with_reason(&mut self, reason: ResetReason) -> PhaseTransitionEvent {
        let from = self.state;
        let frame_index = self.frames_observed;
        self.reset();
        PhaseTransitionEvent::Reset {
            from,
            reason,
            frame_index,
        }
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn kind(&self) -> TestKind {
        self.protocol.kind()
    }

    pub fn protocol(&self) -> &dyn TestProtocol {
        self.protocol.as_ref()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    pub fn extremum(&self) -> &ExtremumTracker {
        &self.tracker
    }

    /// Distances computed on the most recent tracking or returning frame
    pub fn current_distances(&self) -> &[f32] {
        &self.current_distances
    }

    pub fn frames_in_phase(&self) -> u64 {
        self.frames_in_phase
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    /// Positions of the required joints after smoothing
    pub fn positions(&self) -> &HashMap<JointId, Point3> {
        &self.positions
    }

    /// Peak-to-peak spread of a joint's stability window
    pub fn stability_spread(&self, joint: JointId) -> Option<f32> {
        self.windows
            .iter()
            .find(|(j, _)| *j == joint)
            .and_then(|(_, window)| window.spread())
    }

    /// Copy required joints into `positions`, `None` when any is unusable
    fn collect_positions(&mut self, joints: &JointMap) -> Option<(u64, u64)> {
        let mut frame_index = 0;
        let mut timestamp_nanos = 0;

        for joint in self.protocol.required_joints() {
            match joints.get(joint) {
                Some(sample) if sample.tracked => {
                    frame_index = frame_index.max(sample.frame_index);
                    timestamp_nanos = timestamp_nanos.max(sample.timestamp_nanos);
                }
                _ => {
                    trace!("Joint {} not tracked, skipping frame", joint);
                    return None;
                }
            }
        }

        for joint in self.protocol.required_joints() {
            if let Some(sample) = joints.get(joint) {
                let position = match self.smoother.as_mut() {
                    Some(smoother) => smoother.smooth(*joint, sample.position),
                    None => sample.position,
                };
                self.positions.insert(*joint, position);
            }
        }

        Some((frame_index, timestamp_nanos))
    }

    fn step(&mut self, stable: bool, frame_index: u64, timestamp_nanos: u64) -> Option<PhaseTransitionEvent> {
        let ctx = FrameContext {
            positions: &self.positions,
            baselines: &self.baselines,
            config: &self.config,
            stable,
            frame_index,
            timestamp_nanos,
        };

        match self.state {
            PhaseState::AwaitingStability => {
                if stable && self.protocol.ready(&ctx) {
                    self.baselines.ready = Some(self.snapshot(frame_index, timestamp_nanos));
                    return Some(self.advance(PhaseState::Ready, frame_index));
                }
            }
            PhaseState::Ready => {
                let stability_ok = stable || !self.config.require_stability_to_initiate;
                if stability_ok && self.protocol.initiated(&ctx) {
                    self.baselines.motion = Some(self.snapshot(frame_index, timestamp_nanos));
                    return Some(self.advance(PhaseState::MotionInitiated, frame_index));
                }
            }
            PhaseState::MotionInitiated => {
                if self.protocol.motion_started(&ctx) {
                    let distances = self.protocol.distances(&ctx);
                    self.tracker.update(&distances);
                    self.current_distances = distances;
                    return Some(self.advance(PhaseState::ExtremumTracking, frame_index));
                }
            }
            PhaseState::ExtremumTracking => {
                let distances = self.protocol.distances(&ctx);
                self.tracker.update(&distances);
                let passed = self.protocol.extremum_reached(&ctx, &self.tracker);
                self.current_distances = distances;

                if passed {
                    if !self.tracker.has_moved() {
                        warn!(
                            "{}: extremum never exceeded zero, restarting session",
                            self.protocol.kind()
                        );
                        let event = PhaseTransitionEvent::Reset {
                            from: self.state,
                            reason: ResetReason::InvalidSession,
                            frame_index,
                        };
                        self.reset();
                        return Some(event);
                    }
                    debug!("Extremum confirmed at {:?}", self.tracker.maxima());
                    self.baselines.extremum = Some(self.snapshot(frame_index, timestamp_nanos));
                    return Some(self.advance(PhaseState::Returning, frame_index));
                }
            }
            PhaseState::Returning => {
                let distances = self.protocol.distances(&ctx);
                let returned = self.protocol.returned(&ctx, &distances);
                self.current_distances = distances;

                if returned {
                    let metrics = self.protocol.summarize(&SummaryContext {
                        tracker: &self.tracker,
                        baselines: &self.baselines,
                        completed_at_nanos: timestamp_nanos,
                    });
                    let result =
                        SessionResult::new(self.protocol.kind(), metrics, frame_index, timestamp_nanos);
                    info!("{} completed: {:?}", self.protocol.kind(), result.metrics);

                    let from = self.state;
                    self.state = PhaseState::Completed;
                    self.frames_in_phase = 0;
                    return Some(PhaseTransitionEvent::Completed { from, result });
                }
            }
            PhaseState::Completed => {}
        }

        None
    }

    fn check_phase_timeout(&mut self, frame_index: u64) -> Option<PhaseTransitionEvent> {
        let limit = self.config.phase_timeout_frames?;
        if self.state == PhaseState::AwaitingStability || self.state.is_terminal() {
            return None;
        }
        if self.frames_in_phase <= limit as u64 {
            return None;
        }

        warn!(
            "{}: {} exceeded {} frames, restarting session",
            self.protocol.kind(),
            self.state,
            limit
        );
        let from = self.state;
        self.reset();
        Some(PhaseTransitionEvent::Reset {
            from,
            reason: ResetReason::PhaseTimeout,
            frame_index,
        })
    }

    fn advance(&mut self, to: PhaseState, frame_index: u64) -> PhaseTransitionEvent {
        let from = self.state;
        info!("{}: {} -> {} at frame {}", self.protocol.kind(), from, to, frame_index);
        self.state = to;
        self.frames_in_phase = 0;
        PhaseTransitionEvent::Advanced {
            from,
            to,
            frame_index,
        }
    }

    fn snapshot(&self, frame_index: u64, timestamp_nanos: u64) -> Baseline {
        Baseline::capture(
            &self.positions,
            self.protocol.required_joints(),
            frame_index,
            timestamp_nanos,
        )
    }
}

impl std::fmt::Debug for MotionPhaseDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionPhaseDetector")
            .field("kind", &self.protocol.kind())
            .field("state", &self.state)
            .field("frames_in_phase", &self.frames_in_phase)
            .field("maxima", &self.tracker.maxima())
            .finish()
    }
}
