//! L4 Atomic Layer: Time calculation utilities for frame-driven animations
//!
//! Provides pure functions for calculating animation progress and interpolation.
//! Time is passed in explicitly as elapsed frame time so animations advance
//! only on the shared ticker.

use std::time::Duration;

/// Calculate animation progress (0.0 to 1.0) from elapsed time and duration
///
/// # Arguments
/// * `elapsed` - Time since the animation started
/// * `duration` - Total animation duration
///
/// # Returns
/// Progress value clamped to [0.0, 1.0]
#[inline]
pub fn progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let ratio = elapsed.as_secs_f64() / duration.as_secs_f64();
    ratio.clamp(0.0, 1.0)
}

/// Check if animation is complete
#[inline]
pub fn is_complete(elapsed: Duration, duration: Duration) -> bool {
    elapsed >= duration
}

/// Linear interpolation between two values
///
/// # Arguments
/// * `from` - Start value
/// * `to` - End value
/// * `t` - Interpolation factor [0.0, 1.0]
///
/// # Returns
/// Interpolated value
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Per-frame lerp factor rescaled to an arbitrary frame duration.
///
/// `factor` is defined against a 60fps frame; a longer `dt` compounds it so
/// the settle time does not depend on the tick rate.
#[inline]
pub fn frame_factor(factor: f64, dt: Duration) -> f64 {
    let factor = factor.clamp(0.0, 1.0);
    let frames = dt.as_secs_f64() * 60.0;
    1.0 - (1.0 - factor).powf(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 100.0, 0.0) - 0.0).abs() < 0.001);
        assert!((lerp(0.0, 100.0, 0.5) - 50.0).abs() < 0.001);
        assert!((lerp(0.0, 100.0, 1.0) - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_progress_zero_duration() {
        assert!((progress(Duration::ZERO, Duration::ZERO) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_progress_clamped() {
        let d = Duration::from_millis(100);
        assert!((progress(Duration::from_millis(50), d) - 0.5).abs() < 0.001);
        assert!((progress(Duration::from_millis(500), d) - 1.0).abs() < 0.001);
        assert!(is_complete(Duration::from_millis(100), d));
    }

    #[test]
    fn test_frame_factor_matches_at_60fps() {
        let one_frame = Duration::from_secs_f64(1.0 / 60.0);
        assert!((frame_factor(0.1, one_frame) - 0.1).abs() < 1e-6);
        // Two frames' worth compounds
        let two = frame_factor(0.1, one_frame * 2);
        assert!((two - 0.19).abs() < 1e-6);
    }
}
