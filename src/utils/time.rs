use crate::config::constants::performance::NANOSECONDS_PER_SECOND;

/// Frame period for a nominal frame rate, zero rate yields zero
pub fn frame_period_nanos(frame_rate_hz: u32) -> u64 {
    if frame_rate_hz == 0 {
        return 0;
    }
    NANOSECONDS_PER_SECOND / frame_rate_hz as u64
}

/// Elapsed seconds between two sensor timestamps, saturating at zero
pub fn elapsed_seconds(start_nanos: u64, end_nanos: u64) -> f64 {
    end_nanos.saturating_sub(start_nanos) as f64 / NANOSECONDS_PER_SECOND as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_period() {
        assert_eq!(frame_period_nanos(30), 33_333_333);
        assert_eq!(frame_period_nanos(0), 0);
    }

    #[test]
    fn test_elapsed_seconds() {
        assert!((elapsed_seconds(1_000_000_000, 3_500_000_000) - 2.5).abs() < 1e-9);
        assert_eq!(elapsed_seconds(10, 5), 0.0);
    }
}
