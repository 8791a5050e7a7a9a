pub mod binding;
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod page;
pub mod pointer;
pub mod scroll;
pub mod transition;
pub mod trigger;

pub use binding::{BindingManager, BindingStats};
pub use config::{AppConfig, EasingType, ScrollConfig};
pub use error::{Error, Result};
pub use events::LifecycleEvent;
pub use orchestrator::{NavigationOutcome, Navigator, Orchestrator};
