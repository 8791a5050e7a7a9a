//! L3 Molecular Layer: Eased virtual scroll
//!
//! Combines easing functions and timing utilities to animate the virtual
//! position over a fixed duration. Alternative to the inertial backend,
//! selected with `scroll.backend = "eased"`.

use std::time::Duration;

use crate::config::{EasingType, ScrollBackendKind};
use crate::page::{Container, ContainerId};
use crate::Result;

use super::easing::EasingTypeExt;
use super::engine::{
    EngineBase, ScrollBackend, ScrollCallback, ScrollEvent, ScrollEventKind, ScrollHandle,
    ScrollOptions, Viewport,
};
use super::timing::{is_complete, lerp, progress};

/// Factory for [`EasedScroll`] instances
#[derive(Debug, Clone, Copy, Default)]
pub struct EasedScrollBackend;

impl ScrollBackend for EasedScrollBackend {
    fn kind(&self) -> ScrollBackendKind {
        ScrollBackendKind::Eased
    }

    fn create(&mut self, container: &Container, options: &ScrollOptions) -> Result<Box<dyn ScrollHandle>> {
        Ok(Box::new(EasedScroll::new(container, options)))
    }
}

/// Active scroll animation state
#[derive(Debug, Clone)]
struct ActiveAnimation {
    /// Time spent so far
    elapsed: Duration,
    /// Starting scroll position
    from: f64,
    /// Target scroll position
    to: f64,
    /// Animation duration
    duration: Duration,
    /// Easing function
    easing: EasingType,
}

/// Scroll animation controller
///
/// Call `scroll_by()` to queue movement, then `update()` each frame to
/// advance the interpolated position.
pub struct EasedScroll {
    base: EngineBase,
    /// Current active animation (if any)
    animation: Option<ActiveAnimation>,
    /// Current scroll position (always up-to-date)
    current: f64,
    /// Pending scroll delta for batching multiple scroll events
    pending_delta: f64,
    smooth: bool,
    duration: Duration,
    easing: EasingType,
}

impl EasedScroll {
    pub fn new(container: &Container, options: &ScrollOptions) -> Self {
        Self {
            base: EngineBase::new(container, options.viewport),
            animation: None,
            current: 0.0,
            pending_delta: 0.0,
            smooth: options.smooth,
            duration: options.duration,
            easing: options.easing,
        }
    }

    /// Check if an animation is currently active
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    fn move_to(&mut self, position: f64) {
        if position != self.current {
            self.current = position;
            self.base.emit(ScrollEvent::Scroll { position });
        }
    }
}

impl ScrollHandle for EasedScroll {
    fn container(&self) -> ContainerId {
        self.base.container
    }

    fn current_position(&self) -> f64 {
        self.current
    }

    /// Get the target scroll position (final position after animation)
    fn target_position(&self) -> f64 {
        self.animation
            .as_ref()
            .map(|a| a.to)
            .unwrap_or(self.current)
    }

    fn limit(&self) -> f64 {
        self.base.limit()
    }

    fn viewport(&self) -> Viewport {
        self.base.viewport
    }

    fn scroll_to(&mut self, position: f64) {
        if self.base.destroyed {
            return;
        }
        self.animation = None;
        self.pending_delta = 0.0;
        let position = self.base.clamp(position);
        self.move_to(position);
    }

    /// Multiple scroll events within the same animation frame are batched
    /// together for smoother handling of rapid input.
    fn scroll_by(&mut self, delta: f64) {
        if !self.base.enabled || !delta.is_finite() {
            return;
        }
        if !self.smooth {
            let next = self.base.clamp(self.current + delta);
            self.animation = None;
            self.move_to(next);
            return;
        }
        self.pending_delta += delta;
    }

    fn on(&mut self, kind: ScrollEventKind, callback: ScrollCallback) {
        self.base.listen(kind, callback);
    }

    fn enable(&mut self) {
        if !self.base.destroyed {
            self.base.enabled = true;
        }
    }

    fn disable(&mut self) {
        self.base.enabled = false;
        self.animation = None;
        self.pending_delta = 0.0;
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    fn resize(&mut self, viewport: Viewport) {
        if self.base.destroyed {
            return;
        }
        self.base.resize(viewport);
        if let Some(anim) = self.animation.as_mut() {
            anim.to = anim.to.min(self.base.limit());
        }
        let clamped = self.base.clamp(self.current);
        self.move_to(clamped);
    }

    fn update(&mut self, dt: Duration) {
        if !self.base.enabled || self.base.destroyed {
            return;
        }

        // Process any pending scroll delta
        if self.pending_delta != 0.0 {
            let target = self.base.clamp(self.target_position() + self.pending_delta);
            self.pending_delta = 0.0;

            // Start or update animation to new target
            if target != self.current {
                self.animation = Some(ActiveAnimation {
                    elapsed: Duration::ZERO,
                    from: self.current,
                    to: target,
                    duration: self.duration,
                    easing: self.easing,
                });
            }
        }

        // Update active animation
        let Some(anim) = self.animation.as_mut() else {
            return;
        };
        anim.elapsed += dt;
        let next = if is_complete(anim.elapsed, anim.duration) {
            let to = anim.to;
            self.animation = None;
            to
        } else {
            let t = progress(anim.elapsed, anim.duration);
            lerp(anim.from, anim.to, anim.easing.apply(t))
        };
        let next = self.base.clamp(next);
        self.move_to(next);
    }

    fn destroy(&mut self) {
        self.animation = None;
        self.pending_delta = 0.0;
        self.base.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.base.destroyed
    }
}
