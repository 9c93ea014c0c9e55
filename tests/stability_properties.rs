// tests/stability_properties.rs
//! Property tests for stability windows and extremum tracking

use motion_assess::detection::{is_stable, ExtremumTracker, StabilityWindow};
use proptest::prelude::*;

proptest! {
    #[test]
    fn window_never_exceeds_capacity(
        capacity in 1usize..50,
        values in prop::collection::vec(-2.0f32..2.0, 0..200),
    ) {
        let mut window = StabilityWindow::new(capacity);
        for value in &values {
            window.push(*value);
            prop_assert!(window.len() <= capacity);
        }
        prop_assert_eq!(window.len(), values.len().min(capacity));
    }

    #[test]
    fn window_keeps_most_recent_values(
        capacity in 1usize..20,
        values in prop::collection::vec(-2.0f32..2.0, 1..100),
    ) {
        let mut window = StabilityWindow::new(capacity);
        for value in &values {
            window.push(*value);
        }
        let start = values.len().saturating_sub(capacity);
        let kept: Vec<f32> = window.values().collect();
        prop_assert_eq!(&kept[..], &values[start..]);
        prop_assert_eq!(window.latest(), values.last().copied());
    }

    #[test]
    fn partial_window_is_never_stable(
        capacity in 2usize..40,
        value in -2.0f32..2.0,
    ) {
        let mut window = StabilityWindow::new(capacity);
        for _ in 0..capacity - 1 {
            window.push(value);
            prop_assert!(!is_stable(&window, 1.0));
        }
        window.push(value);
        prop_assert!(is_stable(&window, 0.0));
    }

    #[test]
    fn stable_iff_spread_within_threshold(
        values in prop::collection::vec(0.9f32..1.1, 10),
        threshold in 0.001f32..0.3,
    ) {
        let mut window = StabilityWindow::new(10);
        for value in &values {
            window.push(*value);
        }
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert_eq!(is_stable(&window, threshold), max - min <= threshold);
    }

    #[test]
    fn tracker_maxima_never_decrease(
        frames in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 2), 1..100),
    ) {
        let mut tracker = ExtremumTracker::new();
        let mut previous = vec![0.0f32; 2];
        for distances in &frames {
            tracker.update(distances);
            for (now, before) in tracker.maxima().iter().zip(&previous) {
                prop_assert!(now >= before);
            }
            previous = tracker.maxima().to_vec();
        }
        prop_assert!(tracker.peak() >= 0.0);
        prop_assert_eq!(tracker.frames_tracked(), frames.len() as u64);
    }

    #[test]
    fn negative_distances_never_count_as_moved(
        frames in prop::collection::vec(-1.0f32..=0.0, 1..50),
    ) {
        let mut tracker = ExtremumTracker::new();
        for distance in frames {
            tracker.update(&[distance]);
        }
        prop_assert!(!tracker.has_moved());
    }
}
