// src/session.rs
//! Assessment session
//!
//! Glue between a skeleton source, the phase detector, the announcer and the
//! result log for one test kind.

use crate::config::detector_config::validate_detector_config;
use crate::config::SystemConfig;
use crate::detection::{
    MotionPhaseDetector, PhaseState, PhaseTransitionEvent, ResetReason, SessionResult, TestKind,
};
use crate::error::{AssessError, AssessResult};
use crate::reporting::ResultLogger;
use crate::sensor::{SkeletonFrame, SkeletonSource};
use crate::speech::Announcer;
use tracing::{debug, info, warn};

pub struct AssessmentSession {
    kind: TestKind,
    detector: MotionPhaseDetector,
    logger: Option<ResultLogger>,
    announcer: Announcer,
    results: Vec<SessionResult>,
    frames_processed: u64,
    frames_without_body: u64,
    max_session_frames: Option<u64>,
}

impl AssessmentSession {
    pub fn new(kind: TestKind, config: &SystemConfig, announcer: Announcer) -> AssessResult<Self> {
        validate_detector_config(kind.detector_config(&config.tests))?;

        let logger = config
            .reporting
            .enabled
            .then(|| ResultLogger::for_test(kind, &config.reporting));

        let mut session = Self::with_detector(
            MotionPhaseDetector::for_test(kind, &config.tests),
            logger,
            announcer,
        );
        session.max_session_frames = config.system.max_session_frames;
        Ok(session)
    }

    /// Session around an already configured detector
    pub fn with_detector(
        detector: MotionPhaseDetector,
        logger: Option<ResultLogger>,
        announcer: Announcer,
    ) -> Self {
        Self {
            kind: detector.kind(),
            detector,
            logger,
            announcer,
            results: Vec::new(),
            frames_processed: 0,
            frames_without_body: 0,
            max_session_frames: None,
        }
    }

    /// Feed one sensor frame. Frames without a tracked body are skipped.
    pub fn process_frame(
        &mut self,
        frame: &SkeletonFrame,
    ) -> AssessResult<Option<PhaseTransitionEvent>> {
        self.frames_processed += 1;

        let Some(body) = frame.first_tracked_body() else {
            self.frames_without_body += 1;
            return Ok(None);
        };

        let Some(event) = self.detector.observe(&body.joints) else {
            return Ok(None);
        };

        self.handle_event(&event)?;
        Ok(Some(event))
    }

    /// Drive the session from `source` until a result is produced or the source runs dry
    pub async fn run<S>(
        &mut self,
        source: &mut S,
        max_frames: Option<u64>,
    ) -> AssessResult<Option<SessionResult>>
    where
        S: SkeletonSource + ?Sized,
    {
        source
            .open()
            .await
            .map_err(|e| AssessError::SensorUnavailable(e.to_string()))?;
        let info = source.source_info();
        info!("Running {} from {}", self.kind, info.name);

        let limit = max_frames.or(self.max_session_frames);
        let mut frames = 0u64;
        let mut outcome = None;

        while limit.map_or(true, |limit| frames < limit) {
            let frame = match source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("Source exhausted after {} frames", frames);
                    break;
                }
                Err(e) => {
                    let _ = source.close().await;
                    return Err(AssessError::Sensor(e.to_string()));
                }
            };
            frames += 1;

            if let Some(PhaseTransitionEvent::Completed { result, .. }) = self.process_frame(&frame)? {
                outcome = Some(result);
                break;
            }
        }

        if outcome.is_none() {
            info!(
                "{} ended in {} without a result after {} frames",
                self.kind,
                self.detector.state(),
                frames
            );
        }

        if let Err(e) = source.close().await {
            warn!("Failed to close skeleton source: {}", e);
        }
        Ok(outcome)
    }

    /// Operator-requested restart of the current attempt
    pub fn restart(&mut self) -> AssessResult<PhaseTransitionEvent> {
        let event = self.detector.reset_with_reason(ResetReason::Operator);
        self.handle_event(&event)?;
        Ok(event)
    }

    pub fn kind(&self) -> TestKind {
        self.kind
    }

    pub fn state(&self) -> PhaseState {
        self.detector.state()
    }

    pub fn detector(&self) -> &MotionPhaseDetector {
        &self.detector
    }

    pub fn completed_results(&self) -> &[SessionResult] {
        &self.results
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_without_body(&self) -> u64 {
        self.frames_without_body
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    /// Wait until every queued prompt has been spoken; later prompts are dropped
    pub fn drain_announcements(&mut self) {
        self.announcer.drain();
    }

    fn handle_event(&mut self, event: &PhaseTransitionEvent) -> AssessResult<()> {
        match event {
            PhaseTransitionEvent::Advanced { from, to, frame_index } => {
                info!("{}: {} -> {} at frame {}", self.kind, from, to, frame_index);
            }
            PhaseTransitionEvent::Completed { from, result } => {
                info!(
                    "{}: {} -> Completed at frame {}",
                    self.kind, from, result.frame_index
                );
                if let Some(logger) = self.logger.as_ref() {
                    logger.append(result)?;
                }
                self.results.push(result.clone());
            }
            PhaseTransitionEvent::Reset { from, reason, frame_index } => {
                warn!(
                    "{}: reset from {} at frame {} ({})",
                    self.kind, from, frame_index, reason
                );
            }
        }

        for prompt in prompts_for(self.kind, event) {
            self.announcer.announce(prompt);
        }
        Ok(())
    }
}

impl std::fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("kind", &self.kind)
            .field("state", &self.detector.state())
            .field("results", &self.results.len())
            .field("frames_processed", &self.frames_processed)
            .finish()
    }
}

/// Spoken prompts for a transition, in the order they should be said
pub fn prompts_for(kind: TestKind, event: &PhaseTransitionEvent) -> Vec<&'static str> {
    match event {
        PhaseTransitionEvent::Advanced { to, .. } => match (kind, to) {
            (TestKind::FunctionalReach, PhaseState::Ready) => {
                vec!["Test Ready", "Please raise both of your arms"]
            }
            (TestKind::FunctionalReach, PhaseState::MotionInitiated) => vec!["Test Started"],
            (TestKind::FunctionalReach, PhaseState::Returning) => {
                vec!["You Have Reached your limit, Please go back to your initial Position now"]
            }
            (TestKind::ForwardBend, PhaseState::Ready) => vec!["Please raise your arms"],
            (TestKind::ForwardBend, PhaseState::MotionInitiated) => vec!["Please bend forward"],
            (TestKind::UpAndGo, PhaseState::Ready) => vec!["Test ready please stand up"],
            (TestKind::UpAndGo, PhaseState::MotionInitiated) => vec!["Timer Started"],
            (TestKind::UpAndGo, PhaseState::Returning) => {
                vec!["Target depth reached, Please Turn around"]
            }
            (TestKind::WalkingSpeed, PhaseState::Ready) => vec!["Test Ready"],
            (TestKind::WalkingSpeed, PhaseState::MotionInitiated) => vec!["Timer Started"],
            _ => Vec::new(),
        },
        PhaseTransitionEvent::Completed { .. } => vec!["Test Completed"],
        PhaseTransitionEvent::Reset { reason: ResetReason::InvalidSession, .. } => {
            vec!["Test Invalid", "Test Restarted"]
        }
        PhaseTransitionEvent::Reset { .. } => vec!["Test Restarted"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Body, JointMap};
    use crate::speech::{RecordingSpeechEngine, SpeechConfig};

    fn quiet_config() -> SystemConfig {
        let mut config = SystemConfig::default();
        config.reporting.enabled = false;
        config
    }

    #[test]
    fn test_prompts() {
        let ready = PhaseTransitionEvent::Advanced {
            from: PhaseState::AwaitingStability,
            to: PhaseState::Ready,
            frame_index: 3,
        };
        assert_eq!(prompts_for(TestKind::ForwardBend, &ready), vec!["Please raise your arms"]);
        assert_eq!(
            prompts_for(TestKind::FunctionalReach, &ready),
            vec!["Test Ready", "Please raise both of your arms"]
        );

        let tracking = PhaseTransitionEvent::Advanced {
            from: PhaseState::MotionInitiated,
            to: PhaseState::ExtremumTracking,
            frame_index: 9,
        };
        assert!(prompts_for(TestKind::ForwardBend, &tracking).is_empty());

        let invalid = PhaseTransitionEvent::Reset {
            from: PhaseState::Returning,
            reason: ResetReason::InvalidSession,
            frame_index: 20,
        };
        assert_eq!(
            prompts_for(TestKind::FunctionalReach, &invalid),
            vec!["Test Invalid", "Test Restarted"]
        );
    }

    #[test]
    fn test_frames_without_body_skipped() {
        let mut session =
            AssessmentSession::new(TestKind::ForwardBend, &quiet_config(), Announcer::disabled())
                .unwrap();

        let mut frame = SkeletonFrame::empty(0, 0);
        assert!(session.process_frame(&frame).unwrap().is_none());

        frame.bodies.push(Body {
            tracking_id: 7,
            is_tracked: false,
            joints: JointMap::new(),
        });
        assert!(session.process_frame(&frame).unwrap().is_none());

        assert_eq!(session.frames_processed(), 2);
        assert_eq!(session.frames_without_body(), 2);
        assert_eq!(session.state(), PhaseState::AwaitingStability);
    }

    #[test]
    fn test_invalid_detector_config_rejected() {
        let mut config = quiet_config();
        config.tests.up_and_go.detector.stability_window_frames = 0;
        let err = AssessmentSession::new(TestKind::UpAndGo, &config, Announcer::disabled())
            .unwrap_err();
        assert!(matches!(err, AssessError::Validation(_)));
    }

    #[test]
    fn test_operator_restart_announced() {
        let engine = RecordingSpeechEngine::new();
        let announcer = Announcer::spawn(engine.clone(), &SpeechConfig::default());
        let mut session =
            AssessmentSession::new(TestKind::WalkingSpeed, &quiet_config(), announcer).unwrap();

        let event = session.restart().unwrap();
        assert!(event.is_reset());

        session.drain_announcements();
        assert_eq!(engine.spoken(), vec!["Test Restarted"]);
    }
}
