//! L4 Atomic Layer: Configuration types for virtual scrolling
//!
//! Re-exports configuration from the config module and provides additional utilities.

use std::time::Duration;

pub use crate::config::{PinStrategy, ScrollBackendKind, ScrollConfig};

use super::engine::{ScrollOptions, Viewport};

/// Extension trait for ScrollConfig with utility methods
pub trait ScrollConfigExt {
    /// Get animation duration as Duration
    fn animation_duration(&self) -> Duration;

    /// Get tick duration for animation FPS
    fn animation_tick_duration(&self) -> Duration;

    /// Check if smooth scrolling is effectively enabled
    fn is_smooth(&self) -> bool;

    /// Configured viewport size
    fn viewport(&self) -> Viewport;

    /// Options passed to the scroll backend for each new binding
    fn scroll_options(&self) -> ScrollOptions;
}

impl ScrollConfigExt for ScrollConfig {
    #[inline]
    fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    #[inline]
    fn animation_tick_duration(&self) -> Duration {
        if self.animation_fps == 0 {
            Duration::from_millis(16) // ~60fps fallback
        } else {
            Duration::from_millis(1000 / self.animation_fps as u64)
        }
    }

    #[inline]
    fn is_smooth(&self) -> bool {
        self.smooth_enabled
            && match self.backend {
                ScrollBackendKind::Eased => self.animation_duration_ms > 0,
                ScrollBackendKind::Inertial => self.inertia > 0.0 && self.inertia < 1.0,
            }
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }

    fn scroll_options(&self) -> ScrollOptions {
        ScrollOptions {
            smooth: self.is_smooth(),
            duration: self.animation_duration(),
            easing: self.easing,
            inertia: self.inertia,
            viewport: self.viewport(),
            pin_strategy: self.pin_strategy,
        }
    }
}
