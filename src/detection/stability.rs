// src/detection/stability.rs
//! Stability windows and positional smoothing

use crate::sensor::types::{JointId, Point3};
use std::collections::{HashMap, VecDeque};

/// Bounded FIFO history of one joint axis
#[derive(Debug, Clone)]
pub struct StabilityWindow {
    values: VecDeque<f32>,
    capacity: usize,
}

impl StabilityWindow {
    /// Create window holding at most `capacity` values
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest once full
    pub fn push(&mut self, value: f32) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Window has reached its configured capacity
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Peak-to-peak spread (max - min), `None` when empty
    pub fn spread(&self) -> Option<f32> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), v| (min.min(v), max.max(v)));
        Some(max - min)
    }

    pub fn latest(&self) -> Option<f32> {
        self.values.back().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Stable only once the window is full and its spread is within `threshold`
pub fn is_stable(window: &StabilityWindow, threshold: f32) -> bool {
    if !window.is_full() {
        return false;
    }
    match window.spread() {
        Some(spread) => spread <= threshold,
        None => false,
    }
}

/// Moving average of recent joint positions
#[derive(Debug, Clone)]
pub struct MovingAverage {
    history: VecDeque<Point3>,
    window: usize,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Add a position and return the smoothed position
    pub fn update(&mut self, position: Point3) -> Point3 {
        self.history.push_back(position);
        if self.history.len() > self.window {
            self.history.pop_front();
        }

        let n = self.history.len() as f32;
        let sum = self.history.iter().fold(Point3::default(), |acc, p| {
            Point3::new(acc.x + p.x, acc.y + p.y, acc.z + p.z)
        });
        Point3::new(sum.x / n, sum.y / n, sum.z / n)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Per-joint moving average smoother
#[derive(Debug, Clone)]
pub struct JointSmoother {
    window: usize,
    filters: HashMap<JointId, MovingAverage>,
}

impl JointSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            filters: HashMap::new(),
        }
    }

    pub fn smooth(&mut self, joint: JointId, position: Point3) -> Point3 {
        let window = self.window;
        self.filters
            .entry(joint)
            .or_insert_with(|| MovingAverage::new(window))
            .update(position)
    }

    pub fn reset(&mut self) {
        self.filters.clear();
    }
}
