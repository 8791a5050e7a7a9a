//! The full-screen wipe overlay
//!
//! One quadratic path in a 100x100 box: `base` is the side the overlay is
//! anchored to, `edge` where its straight sides end, `control` how far the
//! curve between them bows.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::scroll::timing::lerp;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WipeShape {
    pub base: f64,
    pub edge: f64,
    pub control: f64,
}

impl WipeShape {
    /// Top-anchored, nothing covered
    pub const TOP_FLAT: WipeShape = WipeShape::new(0.0, 0.0, 0.0);
    pub const TOP_BOWED: WipeShape = WipeShape::new(0.0, 50.0, 100.0);
    pub const TOP_FULL: WipeShape = WipeShape::new(0.0, 100.0, 100.0);
    /// Bottom-anchored, everything covered
    pub const BOTTOM_FULL: WipeShape = WipeShape::new(100.0, 0.0, 0.0);
    pub const BOTTOM_BOWED: WipeShape = WipeShape::new(100.0, 50.0, 100.0);
    pub const BOTTOM_FLAT: WipeShape = WipeShape::new(100.0, 100.0, 100.0);

    pub const fn new(base: f64, edge: f64, control: f64) -> Self {
        Self { base, edge, control }
    }

    /// SVG path data
    pub fn to_path(&self) -> String {
        format!(
            "M 0 {} V {} Q 50 {} 100 {} V {} z",
            self.base, self.edge, self.control, self.edge, self.base
        )
    }

    /// Interpolate towards `to`. The anchor is taken from `to`.
    pub fn lerp(&self, to: &WipeShape, t: f64) -> WipeShape {
        WipeShape {
            base: to.base,
            edge: lerp(self.edge, to.edge, t),
            control: lerp(self.control, to.control, t),
        }
    }

    /// Encloses no area
    pub fn is_invisible(&self) -> bool {
        self.edge == self.base && self.control == self.base
    }
}

/// Where path geometry is written; the core never reads it back
pub trait OverlaySink {
    fn write(&mut self, path: &str);
}

/// The single overlay instance, mutated in place across transitions
pub struct OverlayPath {
    shape: WipeShape,
    sink: Box<dyn OverlaySink>,
}

impl OverlayPath {
    pub fn new(mut sink: Box<dyn OverlaySink>) -> Self {
        let shape = WipeShape::TOP_FLAT;
        sink.write(&shape.to_path());
        Self { shape, sink }
    }

    pub fn shape(&self) -> WipeShape {
        self.shape
    }

    pub fn set(&mut self, shape: WipeShape) {
        if shape != self.shape {
            self.shape = shape;
            self.sink.write(&shape.to_path());
        }
    }

    /// Back to invisible, as after a full reload
    pub fn reset(&mut self) {
        debug!("Overlay reset");
        self.set(WipeShape::TOP_FLAT);
    }
}

/// Records every path written. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct MemoryOverlay {
    writes: Rc<RefCell<Vec<String>>>,
}

impl MemoryOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.writes.borrow().last().cloned()
    }
}

impl OverlaySink for MemoryOverlay {
    fn write(&mut self, path: &str) {
        self.writes.borrow_mut().push(path.to_string());
    }
}
