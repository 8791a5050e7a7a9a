mod choreography;
mod overlay;
mod phase;
mod select;

pub use choreography::{Cast, Role, Stage, Target, Timeline, Tween};
pub use overlay::{MemoryOverlay, OverlayPath, OverlaySink, WipeShape};
pub use phase::{Phase, TransitionRecord};
pub use select::{Selection, SelectionReason, TransitionDef, TransitionTable, IDENTITY};
