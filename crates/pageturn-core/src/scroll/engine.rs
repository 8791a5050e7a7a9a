//! L4 Atomic Layer: The scroll engine capability
//!
//! A scroll engine keeps a virtual scroll position for one container,
//! decoupled from native scrolling. Engines never run their own frame loop;
//! the owner advances them with [`ScrollHandle::update`] on the shared ticker.

use std::time::Duration;

use serde::Serialize;

use crate::config::{EasingType, PinStrategy, ScrollBackendKind};
use crate::page::{Container, ContainerId};
use crate::Result;

use super::eased::EasedScrollBackend;
use super::inertial::InertialScrollBackend;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A viewport with no drawable area cannot anchor trigger geometry
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Bounding rectangle reported to the trigger registry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Per-binding engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOptions {
    pub smooth: bool,
    /// Eased backend: animation length
    pub duration: Duration,
    /// Eased backend: curve
    pub easing: EasingType,
    /// Inertial backend: per-frame interpolation factor
    pub inertia: f64,
    pub viewport: Viewport,
    pub pin_strategy: PinStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollEventKind {
    Scroll,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollEvent {
    /// The virtual position moved
    Scroll { position: f64 },
    /// Viewport or content geometry changed
    Resize { viewport: Viewport, limit: f64 },
}

impl ScrollEvent {
    pub fn kind(&self) -> ScrollEventKind {
        match self {
            ScrollEvent::Scroll { .. } => ScrollEventKind::Scroll,
            ScrollEvent::Resize { .. } => ScrollEventKind::Resize,
        }
    }
}

pub type ScrollCallback = Box<dyn FnMut(&ScrollEvent)>;

/// A live engine instance scoped to one container
pub trait ScrollHandle {
    fn container(&self) -> ContainerId;

    /// Current (interpolated) virtual position
    fn current_position(&self) -> f64;

    /// Where the position is heading
    fn target_position(&self) -> f64;

    /// Maximum scroll position
    fn limit(&self) -> f64;

    fn viewport(&self) -> Viewport;

    /// Jump to a position immediately, dropping any animation in flight
    fn scroll_to(&mut self, position: f64);

    /// User scroll input; animated when smooth scrolling is on
    fn scroll_by(&mut self, delta: f64);

    /// Subscribe to engine notifications
    fn on(&mut self, kind: ScrollEventKind, callback: ScrollCallback);

    fn enable(&mut self);

    /// Stop reacting to input and stop emitting notifications
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;

    /// Recompute limits for a new viewport and notify `Resize` listeners
    fn resize(&mut self, viewport: Viewport);

    /// Advance one frame
    fn update(&mut self, dt: Duration);

    /// Drop every listener; the handle is inert afterwards
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;
}

/// Factory for engine instances
pub trait ScrollBackend {
    fn kind(&self) -> ScrollBackendKind;

    fn create(&mut self, container: &Container, options: &ScrollOptions) -> Result<Box<dyn ScrollHandle>>;
}

/// Build the configured backend
pub fn backend_for(kind: ScrollBackendKind) -> Box<dyn ScrollBackend> {
    match kind {
        ScrollBackendKind::Inertial => Box::new(InertialScrollBackend),
        ScrollBackendKind::Eased => Box::new(EasedScrollBackend),
    }
}

/// Listener lists and lifecycle flags shared by the bundled engines
pub(crate) struct EngineBase {
    pub(crate) container: ContainerId,
    pub(crate) content_height: f64,
    pub(crate) viewport: Viewport,
    pub(crate) enabled: bool,
    pub(crate) destroyed: bool,
    scroll_listeners: Vec<ScrollCallback>,
    resize_listeners: Vec<ScrollCallback>,
}

impl EngineBase {
    pub(crate) fn new(container: &Container, viewport: Viewport) -> Self {
        Self {
            container: container.id,
            content_height: container.height,
            viewport,
            enabled: false,
            destroyed: false,
            scroll_listeners: Vec::new(),
            resize_listeners: Vec::new(),
        }
    }

    pub(crate) fn limit(&self) -> f64 {
        (self.content_height - self.viewport.height).max(0.0)
    }

    pub(crate) fn clamp(&self, position: f64) -> f64 {
        if position.is_finite() {
            position.clamp(0.0, self.limit())
        } else {
            0.0
        }
    }

    pub(crate) fn listen(&mut self, kind: ScrollEventKind, callback: ScrollCallback) {
        if self.destroyed {
            tracing::warn!(container = %self.container, "Ignoring listener on destroyed scroll engine");
            return;
        }
        match kind {
            ScrollEventKind::Scroll => self.scroll_listeners.push(callback),
            ScrollEventKind::Resize => self.resize_listeners.push(callback),
        }
    }

    /// Notify listeners; disabled and destroyed engines stay silent
    pub(crate) fn emit(&mut self, event: ScrollEvent) {
        if !self.enabled || self.destroyed {
            return;
        }
        let listeners = match event.kind() {
            ScrollEventKind::Scroll => &mut self.scroll_listeners,
            ScrollEventKind::Resize => &mut self.resize_listeners,
        };
        for listener in listeners.iter_mut() {
            listener(&event);
        }
    }

    pub(crate) fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let limit = self.limit();
        self.emit(ScrollEvent::Resize { viewport, limit });
    }

    pub(crate) fn destroy(&mut self) {
        self.scroll_listeners.clear();
        self.resize_listeners.clear();
        self.enabled = false;
        self.destroyed = true;
    }
}
