//! Navigation orchestration
//!
//! [`Orchestrator`] runs each navigation through leave, swap, re-bind and
//! enter. [`Navigator`] is the host-side handle for a running orchestrator.

mod navigator;
#[allow(clippy::module_inception)]
mod orchestrator;
mod view;

pub use navigator::{
    Command, NavigationOutcome, NavigationRequest, Navigator, PendingNavigation, Responder,
    TransitionReport,
};
pub use orchestrator::Orchestrator;
pub use view::{ViewContext, ViewHook};
