//! The document the containers live in
//!
//! The orchestrator never touches content itself; it only attaches, hides,
//! fades and removes whole containers through [`PageSurface`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use super::container::{Container, ContainerId};

pub trait PageSurface {
    /// Insert a container into the document
    fn attach(&mut self, container: &Container);

    /// Keep the container in the document but make it invisible
    fn hide(&mut self, id: ContainerId);

    /// Take the container out of the document
    fn remove(&mut self, id: ContainerId);

    fn set_opacity(&mut self, id: ContainerId, opacity: f64);

    /// Reset the native (browser) scroll offset to the top
    fn reset_native_scroll(&mut self);

    fn is_attached(&self, id: ContainerId) -> bool;

    /// Drop every container, as a full reload would
    fn clear(&mut self);
}

/// Structural changes recorded by [`MemorySurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SurfaceOp {
    Attach(ContainerId),
    Hide(ContainerId),
    Remove(ContainerId),
    ResetScroll,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MountedContainer {
    pub id: ContainerId,
    pub namespace: String,
    pub visible: bool,
    pub opacity: f64,
}

#[derive(Debug, Default)]
struct SurfaceState {
    mounted: Vec<MountedContainer>,
    ops: Vec<SurfaceOp>,
}

/// In-memory document. Clones share state so a caller can keep a clone for
/// inspection after handing one to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> Vec<MountedContainer> {
        self.state.borrow().mounted.clone()
    }

    /// Namespaces of visible containers, in document order
    pub fn visible_namespaces(&self) -> Vec<String> {
        self.state
            .borrow()
            .mounted
            .iter()
            .filter(|m| m.visible)
            .map(|m| m.namespace.clone())
            .collect()
    }

    pub fn opacity(&self, id: ContainerId) -> Option<f64> {
        self.state
            .borrow()
            .mounted
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.opacity)
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.state.borrow().ops.clone()
    }

    fn with_mounted(&self, id: ContainerId, f: impl FnOnce(&mut MountedContainer)) {
        if let Some(m) = self.state.borrow_mut().mounted.iter_mut().find(|m| m.id == id) {
            f(m);
        }
    }
}

impl PageSurface for MemorySurface {
    fn attach(&mut self, container: &Container) {
        let mut state = self.state.borrow_mut();
        if state.mounted.iter().any(|m| m.id == container.id) {
            return;
        }
        state.mounted.push(MountedContainer {
            id: container.id,
            namespace: container.namespace.clone(),
            visible: true,
            opacity: 1.0,
        });
        state.ops.push(SurfaceOp::Attach(container.id));
    }

    fn hide(&mut self, id: ContainerId) {
        self.with_mounted(id, |m| m.visible = false);
        self.state.borrow_mut().ops.push(SurfaceOp::Hide(id));
    }

    fn remove(&mut self, id: ContainerId) {
        let mut state = self.state.borrow_mut();
        let before = state.mounted.len();
        state.mounted.retain(|m| m.id != id);
        if state.mounted.len() != before {
            state.ops.push(SurfaceOp::Remove(id));
        }
    }

    fn set_opacity(&mut self, id: ContainerId, opacity: f64) {
        self.with_mounted(id, |m| m.opacity = opacity.clamp(0.0, 1.0));
    }

    fn reset_native_scroll(&mut self) {
        self.state.borrow_mut().ops.push(SurfaceOp::ResetScroll);
    }

    fn is_attached(&self, id: ContainerId) -> bool {
        self.state.borrow().mounted.iter().any(|m| m.id == id)
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.mounted.clear();
        state.ops.push(SurfaceOp::Clear);
    }
}
