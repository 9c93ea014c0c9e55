// src/sensor/simulator.rs
//! Scripted skeleton source
//!
//! Replays a [`MotionScript`] as skeleton frames with seeded positional
//! jitter and optional joint dropout.

use crate::config::constants::{sensor, simulation};
use crate::sensor::script::MotionScript;
use crate::sensor::traits::SkeletonSource;
use crate::sensor::types::{
    Body, JointMap, JointSample, SkeletonFrame, SourceCapabilities, SourceInfo,
};
use crate::utils::time::frame_period_nanos;
use crate::utils::validation::{validate_range, ValidationError, ValidationResult};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulatorConfig {
    pub frame_rate_hz: u32,
    /// Half-width of the uniform noise added to every coordinate
    pub jitter_m: f32,
    /// Chance that a joint is reported untracked in a frame
    pub dropout_probability: f32,
    pub seed: u64,
    /// Sleep one frame period between frames
    pub realtime_pacing: bool,
    /// Bodies the sensor reports as lost before the subject
    pub untracked_bodies: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: sensor::DEFAULT_FRAME_RATE_HZ,
            jitter_m: simulation::DEFAULT_JITTER_M,
            dropout_probability: simulation::DEFAULT_DROPOUT_PROBABILITY,
            seed: simulation::DEFAULT_SEED,
            realtime_pacing: false,
            untracked_bodies: 0,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_range(
            "frame_rate_hz",
            self.frame_rate_hz,
            sensor::MIN_FRAME_RATE_HZ,
            sensor::MAX_FRAME_RATE_HZ,
        )?;
        validate_range("jitter_m", self.jitter_m, 0.0, simulation::MAX_JITTER_M)?;
        validate_range("dropout_probability", self.dropout_probability, 0.0, 1.0)?;
        if self.untracked_bodies >= sensor::MAX_BODIES {
            return Err(ValidationError::OutOfRange {
                field: "untracked_bodies".to_string(),
                value: self.untracked_bodies.to_string(),
                min: "0".to_string(),
                max: (sensor::MAX_BODIES - 1).to_string(),
            });
        }
        Ok(())
    }

    /// Noise-free configuration for deterministic tests
    pub fn noiseless() -> Self {
        Self {
            jitter_m: 0.0,
            ..Self::default()
        }
    }
}

/// Simulator errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Simulator is not open")]
    NotOpen,
}

pub struct ScriptedSkeletonSource {
    config: SimulatorConfig,
    script: MotionScript,
    rng: StdRng,
    cursor: u64,
    frame_period_nanos: u64,
    is_open: bool,
}

impl ScriptedSkeletonSource {
    pub fn new(script: MotionScript, config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config
            .validate()
            .map_err(|e| SimulatorError::Configuration(e.to_string()))?;

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            frame_period_nanos: frame_period_nanos(config.frame_rate_hz),
            config,
            script,
            cursor: 0,
            is_open: false,
        })
    }

    pub fn frames_remaining(&self) -> u64 {
        self.script.frame_count().saturating_sub(self.cursor)
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Build the frame at the cursor and advance it
    fn generate_frame(&mut self) -> Option<SkeletonFrame> {
        let pose = self.script.pose_at(self.cursor)?;
        let sequence = self.cursor;
        let timestamp_nanos = sequence * self.frame_period_nanos;
        self.cursor += 1;

        let jitter = self.config.jitter_m;
        let dropout = self.config.dropout_probability;
        let mut joints = JointMap::new();
        for (joint, position) in pose.joints() {
            let sample = if dropout > 0.0 && self.rng.gen::<f32>() < dropout {
                JointSample::untracked(sequence, timestamp_nanos)
            } else {
                let mut p = *position;
                if jitter > 0.0 {
                    p.x += self.rng.gen_range(-jitter..=jitter);
                    p.y += self.rng.gen_range(-jitter..=jitter);
                    p.z += self.rng.gen_range(-jitter..=jitter);
                }
                JointSample::tracked(p, sequence, timestamp_nanos)
            };
            joints.insert(*joint, sample);
        }

        let mut bodies: Vec<Body> = (0..self.config.untracked_bodies)
            .map(|i| Body {
                tracking_id: 100 + i as u64,
                is_tracked: false,
                joints: JointMap::new(),
            })
            .collect();
        bodies.push(Body {
            tracking_id: 1,
            is_tracked: true,
            joints,
        });

        Some(SkeletonFrame {
            sequence,
            timestamp_nanos,
            bodies,
        })
    }
}

#[async_trait]
impl SkeletonSource for ScriptedSkeletonSource {
    type Error = SimulatorError;

    async fn open(&mut self) -> Result<(), Self::Error> {
        self.is_open = true;
        self.cursor = 0;
        self.rng = StdRng::seed_from_u64(self.config.seed);
        debug!(
            "Scripted source opened, {} frames at {} Hz",
            self.script.frame_count(),
            self.config.frame_rate_hz
        );
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<SkeletonFrame>, Self::Error> {
        if !self.is_open {
            return Err(SimulatorError::NotOpen);
        }

        #[cfg(feature = "desktop")]
        if self.config.realtime_pacing && self.cursor > 0 {
            tokio::time::sleep(std::time::Duration::from_nanos(self.frame_period_nanos)).await;
        }

        Ok(self.generate_frame())
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.is_open = false;
        Ok(())
    }

    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            name: "Scripted Skeleton Simulator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            serial_number: format!("SIM-{:08X}", self.config.seed as u32),
            capabilities: SourceCapabilities {
                nominal_frame_rate_hz: self.config.frame_rate_hz,
                ..SourceCapabilities::default()
            },
        }
    }
}
