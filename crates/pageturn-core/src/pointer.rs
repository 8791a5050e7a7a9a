//! Cursor-follow and hover-distortion feedback
//!
//! Consumes pointer positions and menu hover events only. Each frame yields
//! the follower translation, the displacement-map scale and the opacity of
//! every hover image; drawing them is up to the presentation layer.

use std::time::Duration;

use serde::Serialize;

use crate::config::EasingType;
use crate::scroll::timing::{frame_factor, is_complete, lerp, progress};
use crate::scroll::{EasingTypeExt, Viewport};

/// Per-frame follow factor at 60fps
const FOLLOW: f64 = 0.1;
/// Upper bound of the displacement scale
const MAX_SCALE: f64 = 50.0;
/// Pointer lag at which the scale saturates
const SATURATION_DISTANCE: f64 = 140.0;
const FADE_IN: Duration = Duration::from_millis(500);
const FADE_OUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(&self, to: &Point, t: f64) -> Point {
        Point::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }

    fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f64,
    to: f64,
    elapsed: Duration,
    duration: Duration,
}

/// What to draw this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerFrame {
    /// Follower translation, already offset by a quarter viewport
    pub translate: Point,
    pub scale: f64,
    pub cursor_hover: bool,
    pub image_opacity: Vec<f64>,
}

pub struct PointerFeedback {
    viewport: Viewport,
    pointer: Point,
    translation: Point,
    displacement: Point,
    scale: f64,
    cursor_hover: bool,
    opacity: Vec<f64>,
    fades: Vec<Option<Fade>>,
    current: Option<usize>,
    fade_next: bool,
}

impl PointerFeedback {
    /// `items` is the number of hoverable menu entries, one image each
    pub fn new(viewport: Viewport, items: usize) -> Self {
        let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        Self {
            viewport,
            pointer: center,
            translation: center,
            displacement: Point::default(),
            scale: 0.0,
            cursor_hover: false,
            opacity: vec![0.0; items],
            fades: vec![None; items],
            current: None,
            fade_next: false,
        }
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.pointer = Point::new(x, y);
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn link_enter(&mut self) {
        self.cursor_hover = true;
    }

    pub fn link_leave(&mut self) {
        self.cursor_hover = false;
    }

    /// The pointer entered the menu; the next item image fades in
    pub fn menu_enter(&mut self) {
        self.fade_next = true;
    }

    pub fn menu_leave(&mut self) {
        if let Some(current) = self.current {
            self.start_fade(current, 0.0, FADE_OUT);
        }
    }

    pub fn item_enter(&mut self, index: usize) {
        if index >= self.opacity.len() {
            return;
        }
        if let Some(previous) = self.current {
            self.fades[previous] = None;
            self.opacity[previous] = 0.0;
        }
        self.current = Some(index);

        if self.fade_next {
            self.fade_next = false;
            self.start_fade(index, 1.0, FADE_IN);
        } else {
            self.fades[index] = None;
            self.opacity[index] = 1.0;
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    fn start_fade(&mut self, index: usize, to: f64, duration: Duration) {
        self.fades[index] = Some(Fade {
            from: self.opacity[index],
            to,
            elapsed: Duration::ZERO,
            duration,
        });
    }

    pub fn frame(&mut self, dt: Duration) -> PointerFrame {
        let t = frame_factor(FOLLOW, dt);
        self.translation = self.translation.lerp(&self.pointer, t);
        self.displacement = self.displacement.lerp(&self.pointer, t);

        let lag = self.displacement.distance(&self.pointer);
        self.scale = (MAX_SCALE / SATURATION_DISTANCE * lag).min(MAX_SCALE);

        for (opacity, slot) in self.opacity.iter_mut().zip(self.fades.iter_mut()) {
            let Some(fade) = slot.as_mut() else {
                continue;
            };
            fade.elapsed += dt;
            let eased = EasingType::Cubic.apply(progress(fade.elapsed, fade.duration));
            *opacity = lerp(fade.from, fade.to, eased);
            if is_complete(fade.elapsed, fade.duration) {
                *slot = None;
            }
        }

        PointerFrame {
            translate: Point::new(
                self.translation.x - self.viewport.width / 4.0,
                self.translation.y - self.viewport.height / 4.0,
            ),
            scale: self.scale,
            cursor_hover: self.cursor_hover,
            image_opacity: self.opacity.clone(),
        }
    }
}
