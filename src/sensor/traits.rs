// src/sensor/traits.rs
//! Core sensor traits for skeleton source abstraction

use crate::sensor::types::{SkeletonFrame, SourceInfo};
use async_trait::async_trait;
use std::error::Error;

/// Main trait for body-tracking skeleton sources
#[async_trait]
pub trait SkeletonSource: Send {
    type Error: Error + Send + Sync + 'static;

    /// Open the sensor and its body-frame reader
    async fn open(&mut self) -> Result<(), Self::Error>;

    /// Next skeleton frame, `None` once the source is exhausted or closed
    async fn next_frame(&mut self) -> Result<Option<SkeletonFrame>, Self::Error>;

    /// Release the sensor
    async fn close(&mut self) -> Result<(), Self::Error>;

    /// Get sensor information
    fn source_info(&self) -> SourceInfo;
}
