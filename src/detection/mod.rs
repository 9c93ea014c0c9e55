//! Motion-phase detection
//!
//! Stability windows, phase states, baselines and the protocol-driven
//! detector shared by every clinical test.

pub mod baseline;
pub mod detector;
pub mod phase;
pub mod protocol;
pub mod protocols;
pub mod result;
pub mod stability;

pub use baseline::{Baseline, Baselines, ExtremumTracker};
pub use detector::MotionPhaseDetector;
pub use phase::{PhaseState, PhaseTransitionEvent, ResetReason};
pub use protocol::{build_protocol, FrameContext, SummaryContext, TestKind, TestProtocol};
pub use protocols::{
    ForwardBendProtocol, FunctionalReachProtocol, UpAndGoProtocol, WalkingSpeedProtocol,
};
pub use result::{Metric, MetricUnit, ScaledMetric, SessionResult};
pub use stability::{is_stable, JointSmoother, MovingAverage, StabilityWindow};
