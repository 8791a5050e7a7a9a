//! Leave/enter timelines
//!
//! A [`Timeline`] is a fixed list of tweens with declared start offsets and
//! durations. Sampling it at a point in time writes the overlay shape and
//! container opacities for that instant; nothing is measured.

use std::time::Duration;

use serde::Serialize;

use crate::config::{EasingType, TransitionStyle};
use crate::page::{ContainerId, PageSurface};
use crate::scroll::timing::{lerp, progress};
use crate::scroll::EasingTypeExt;

use super::overlay::{OverlayPath, WipeShape};
use super::select::TransitionDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Leave,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Overlay { from: WipeShape, to: WipeShape },
    Opacity { role: Role, from: f64, to: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    /// Offset from the start of the timeline
    pub at: Duration,
    pub duration: Duration,
    pub easing: EasingType,
    pub target: Target,
}

impl Tween {
    fn end(&self) -> Duration {
        self.at + self.duration
    }
}

/// The containers a timeline animates
#[derive(Debug, Clone, Copy, Default)]
pub struct Cast {
    pub outgoing: Option<ContainerId>,
    pub incoming: Option<ContainerId>,
}

impl Cast {
    fn get(&self, role: Role) -> Option<ContainerId> {
        match role {
            Role::Outgoing => self.outgoing,
            Role::Incoming => self.incoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub stage: Stage,
    tweens: Vec<Tween>,
}

impl Timeline {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            tweens: Vec::new(),
        }
    }

    fn tween(mut self, at: Duration, duration: Duration, easing: EasingType, target: Target) -> Self {
        self.tweens.push(Tween {
            at,
            duration,
            easing,
            target,
        });
        self
    }

    /// Exit choreography for `def`
    pub fn leave(def: &TransitionDef) -> Self {
        let timeline = Self::new(Stage::Leave);
        match def.style {
            TransitionStyle::Instant => timeline,
            TransitionStyle::Fade => timeline.tween(
                Duration::ZERO,
                def.fade,
                EasingType::Cubic,
                Target::Opacity {
                    role: Role::Outgoing,
                    from: 1.0,
                    to: 0.0,
                },
            ),
            TransitionStyle::Wipe => timeline
                .tween(
                    Duration::ZERO,
                    def.fade,
                    EasingType::Cubic,
                    Target::Opacity {
                        role: Role::Outgoing,
                        from: 1.0,
                        to: 0.0,
                    },
                )
                .tween(
                    Duration::ZERO,
                    Duration::ZERO,
                    EasingType::None,
                    Target::Overlay {
                        from: WipeShape::TOP_FLAT,
                        to: WipeShape::TOP_FLAT,
                    },
                )
                .tween(
                    Duration::ZERO,
                    def.cover,
                    EasingType::QuinticIn,
                    Target::Overlay {
                        from: WipeShape::TOP_FLAT,
                        to: WipeShape::TOP_BOWED,
                    },
                )
                .tween(
                    def.cover,
                    def.settle,
                    EasingType::Cubic,
                    Target::Overlay {
                        from: WipeShape::TOP_BOWED,
                        to: WipeShape::TOP_FULL,
                    },
                ),
        }
    }

    /// Entry choreography for `def`. The incoming container is hidden until
    /// its fade starts.
    pub fn enter(def: &TransitionDef) -> Self {
        let hide_incoming = Target::Opacity {
            role: Role::Incoming,
            from: 0.0,
            to: 0.0,
        };
        let fade_in = Target::Opacity {
            role: Role::Incoming,
            from: 0.0,
            to: 1.0,
        };
        let timeline = Self::new(Stage::Enter);
        match def.style {
            TransitionStyle::Instant => timeline,
            TransitionStyle::Fade => timeline
                .tween(Duration::ZERO, Duration::ZERO, EasingType::None, hide_incoming)
                .tween(Duration::ZERO, def.fade, EasingType::Cubic, fade_in),
            TransitionStyle::Wipe => {
                let revealed = def.settle + def.cover;
                timeline
                    .tween(Duration::ZERO, Duration::ZERO, EasingType::None, hide_incoming)
                    .tween(
                        Duration::ZERO,
                        Duration::ZERO,
                        EasingType::None,
                        Target::Overlay {
                            from: WipeShape::BOTTOM_FULL,
                            to: WipeShape::BOTTOM_FULL,
                        },
                    )
                    .tween(
                        Duration::ZERO,
                        def.settle,
                        EasingType::CubicIn,
                        Target::Overlay {
                            from: WipeShape::BOTTOM_FULL,
                            to: WipeShape::BOTTOM_BOWED,
                        },
                    )
                    .tween(
                        def.settle,
                        def.cover,
                        EasingType::Quintic,
                        Target::Overlay {
                            from: WipeShape::BOTTOM_BOWED,
                            to: WipeShape::BOTTOM_FLAT,
                        },
                    )
                    .tween(revealed, def.fade, EasingType::Cubic, fade_in)
            }
        }
    }

    /// Same tweens in the same order, with every offset and duration zero
    pub fn reduced(mut self) -> Self {
        for tween in &mut self.tweens {
            tween.at = Duration::ZERO;
            tween.duration = Duration::ZERO;
        }
        self
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    pub fn duration(&self) -> Duration {
        self.tweens
            .iter()
            .map(Tween::end)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Write the state at `t`. Tweens that have not started yet are skipped;
    /// later tweens override earlier ones on the same target.
    pub fn apply(&self, t: Duration, overlay: &mut OverlayPath, surface: &mut dyn PageSurface, cast: Cast) {
        for tween in self.tweens.iter().filter(|tw| tw.at <= t) {
            let eased = tween
                .easing
                .apply(progress(t - tween.at, tween.duration));
            match tween.target {
                Target::Overlay { from, to } => overlay.set(from.lerp(&to, eased)),
                Target::Opacity { role, from, to } => {
                    if let Some(id) = cast.get(role) {
                        surface.set_opacity(id, lerp(from, to, eased));
                    }
                }
            }
        }
    }
}
