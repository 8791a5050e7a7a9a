//! Scroll-triggered animation registry
//!
//! `condition` parses threshold declarations, `engine` holds the registry
//! capability plus the in-memory [`ThresholdTriggers`], and `set` is the
//! lifecycle glue that ties triggers to the bound container.

mod condition;
mod engine;
mod set;

pub use condition::{Anchor, Condition};
pub use engine::{
    Crossing, ThresholdTriggers, TriggerCallback, TriggerEngine, TriggerEvent, TriggerId,
    TriggerSpec,
};
pub use set::TriggerSet;
