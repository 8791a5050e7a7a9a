//! L3 Molecular Layer: Scroll proxy
//!
//! Adapts a live [`ScrollHandle`] to the [`ScrollSource`] contract that the
//! trigger registry reads every frame. The proxy is the only writer of the
//! engine position on behalf of the registry and swallows the engine's echo
//! of its own writes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::config::PinStrategy;
use crate::page::ContainerId;
use crate::{Error, Result};

use super::engine::{Rect, ScrollEvent, ScrollEventKind, ScrollHandle, Viewport};

/// Positions closer than this are treated as equal
const POSITION_EPSILON: f64 = 1e-6;

/// Read side of the scroll contract, as seen by triggers
pub trait ScrollSource {
    fn container(&self) -> ContainerId;

    fn position(&self) -> f64;

    fn viewport_rect(&self) -> Rect;

    fn pin_strategy(&self) -> PinStrategy;
}

/// What the engine reported since the last drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Notices {
    /// The position moved for a reason other than a proxy write
    pub moved: bool,
    /// Geometry changed, cached trigger geometry is stale
    pub resized: bool,
    /// Echoes of proxy writes that were swallowed
    pub suppressed: u32,
}

/// Resets the re-entrancy flag when the write scope ends
struct WriteScope<'a>(&'a Cell<bool>);

impl<'a> WriteScope<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct ScrollProxy {
    handle: Box<dyn ScrollHandle>,
    pin_strategy: PinStrategy,
    notices: Rc<RefCell<Notices>>,
    writing: Rc<Cell<bool>>,
}

impl ScrollProxy {
    /// Wire a freshly created engine to the proxy after checking that it
    /// satisfies the contract
    pub fn bind(mut handle: Box<dyn ScrollHandle>, pin_strategy: PinStrategy) -> Result<Self> {
        Self::check_conformance(handle.as_ref())?;

        let notices = Rc::new(RefCell::new(Notices::default()));
        let writing = Rc::new(Cell::new(false));

        let (inbox, guard) = (notices.clone(), writing.clone());
        handle.on(
            ScrollEventKind::Scroll,
            Box::new(move |_: &ScrollEvent| {
                let mut notices = inbox.borrow_mut();
                if guard.get() {
                    notices.suppressed += 1;
                } else {
                    notices.moved = true;
                }
            }),
        );

        let inbox = notices.clone();
        handle.on(
            ScrollEventKind::Resize,
            Box::new(move |_: &ScrollEvent| inbox.borrow_mut().resized = true),
        );

        Ok(Self {
            handle,
            pin_strategy,
            notices,
            writing,
        })
    }

    fn check_conformance(handle: &dyn ScrollHandle) -> Result<()> {
        if handle.is_destroyed() {
            return Err(Error::NonConformingScrollSource(format!(
                "engine for container {} is already destroyed",
                handle.container()
            )));
        }
        if !handle.current_position().is_finite() {
            return Err(Error::NonConformingScrollSource(
                "position is not a finite number".to_string(),
            ));
        }
        if !handle.limit().is_finite() || handle.limit() < 0.0 {
            return Err(Error::NonConformingScrollSource(format!(
                "invalid scroll limit {}",
                handle.limit()
            )));
        }
        let viewport = handle.viewport();
        if viewport.is_degenerate() {
            return Err(Error::NonConformingScrollSource(format!(
                "degenerate viewport {}x{}",
                viewport.width, viewport.height
            )));
        }
        Ok(())
    }

    pub fn get_position(&self) -> f64 {
        self.handle.current_position()
    }

    /// Move the engine to `value`.
    ///
    /// Returns `true` when the position actually changed. Writing the current
    /// position again is a no-op, and the engine's `scroll` echo of this write
    /// is swallowed so it cannot loop back into the registry.
    pub fn set_position(&mut self, value: f64) -> bool {
        if self.writing.get() || !value.is_finite() {
            return false;
        }
        let value = value.clamp(0.0, self.handle.limit());
        if (value - self.handle.current_position()).abs() < POSITION_EPSILON {
            return false;
        }
        let _scope = WriteScope::enter(&self.writing);
        self.handle.scroll_to(value);
        true
    }

    pub fn viewport(&self) -> Viewport {
        self.handle.viewport()
    }

    /// Advance the engine one frame and collect what it reported
    pub fn advance(&mut self, dt: Duration) -> Notices {
        self.handle.update(dt);
        self.take_notices()
    }

    pub fn take_notices(&mut self) -> Notices {
        std::mem::take(&mut *self.notices.borrow_mut())
    }

    pub fn handle(&self) -> &dyn ScrollHandle {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> &mut dyn ScrollHandle {
        self.handle.as_mut()
    }
}

impl ScrollSource for ScrollProxy {
    fn container(&self) -> ContainerId {
        self.handle.container()
    }

    fn position(&self) -> f64 {
        self.get_position()
    }

    /// Virtual scroll keeps the scroller pinned to the window
    fn viewport_rect(&self) -> Rect {
        let viewport = self.handle.viewport();
        Rect {
            top: 0.0,
            left: 0.0,
            width: viewport.width,
            height: viewport.height,
        }
    }

    fn pin_strategy(&self) -> PinStrategy {
        self.pin_strategy
    }
}
