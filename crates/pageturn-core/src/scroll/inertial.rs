//! L3 Molecular Layer: Inertial virtual scroll
//!
//! The position chases its target by a fixed fraction each frame, giving the
//! long smooth tail typical of virtual-scroll sites. This is the default
//! backend.

use std::time::Duration;

use crate::config::ScrollBackendKind;
use crate::page::{Container, ContainerId};
use crate::Result;

use super::engine::{
    EngineBase, ScrollBackend, ScrollCallback, ScrollEvent, ScrollEventKind, ScrollHandle,
    ScrollOptions, Viewport,
};
use super::timing::{frame_factor, lerp};

/// Distance below which the position snaps onto the target
const SNAP_DISTANCE: f64 = 0.5;

/// Factory for [`InertialScroll`] instances
#[derive(Debug, Clone, Copy, Default)]
pub struct InertialScrollBackend;

impl ScrollBackend for InertialScrollBackend {
    fn kind(&self) -> ScrollBackendKind {
        ScrollBackendKind::Inertial
    }

    fn create(&mut self, container: &Container, options: &ScrollOptions) -> Result<Box<dyn ScrollHandle>> {
        Ok(Box::new(InertialScroll::new(container, options)))
    }
}

pub struct InertialScroll {
    base: EngineBase,
    position: f64,
    target: f64,
    inertia: f64,
    smooth: bool,
}

impl InertialScroll {
    pub fn new(container: &Container, options: &ScrollOptions) -> Self {
        Self {
            base: EngineBase::new(container, options.viewport),
            position: 0.0,
            target: 0.0,
            inertia: options.inertia,
            smooth: options.smooth,
        }
    }

    fn move_to(&mut self, position: f64) {
        if position != self.position {
            self.position = position;
            self.base.emit(ScrollEvent::Scroll { position });
        }
    }
}

impl ScrollHandle for InertialScroll {
    fn container(&self) -> ContainerId {
        self.base.container
    }

    fn current_position(&self) -> f64 {
        self.position
    }

    fn target_position(&self) -> f64 {
        self.target
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
        let position = self.base.clamp(position);
        self.target = position;
        self.move_to(position);
    }

    fn scroll_by(&mut self, delta: f64) {
        if !self.base.enabled || !delta.is_finite() {
            return;
        }
        self.target = self.base.clamp(self.target + delta);
        if !self.smooth {
            let target = self.target;
            self.move_to(target);
        }
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
        // Freeze where we are; pending inertia must not land on a dead container
        self.target = self.position;
    }

    fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    fn resize(&mut self, viewport: Viewport) {
        if self.base.destroyed {
            return;
        }
        self.base.resize(viewport);
        self.target = self.base.clamp(self.target);
        let clamped = self.base.clamp(self.position);
        self.move_to(clamped);
    }

    fn update(&mut self, dt: Duration) {
        if !self.base.enabled || self.base.destroyed {
            return;
        }
        let distance = self.target - self.position;
        if distance == 0.0 {
            return;
        }
        if distance.abs() < SNAP_DISTANCE {
            let target = self.target;
            self.move_to(target);
            return;
        }
        let next = lerp(self.position, self.target, frame_factor(self.inertia, dt));
        self.move_to(next);
    }

    fn destroy(&mut self) {
        self.base.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.base.destroyed
    }
}
