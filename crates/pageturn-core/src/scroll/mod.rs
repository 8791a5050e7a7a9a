//! Virtual scrolling for pageturn
//!
//! This module keeps the scroll position in software, decoupled from native
//! scrolling, and exposes it to the trigger registry through a proxy.
//!
//! # Architecture
//!
//! ## L4 Atomic Layer
//! - `easing` - Pure easing functions (cubic, quintic, exponential)
//! - `timing` - Time calculation utilities (progress, interpolation)
//! - `config` - Configuration types and defaults (re-exported from config)
//! - `engine` - The scroll engine capability (`ScrollBackend`, `ScrollHandle`)
//!
//! ## L3 Molecular Layer
//! - `inertial` - Lerp-follow engine (default backend)
//! - `eased` - Duration + easing engine (alternative backend)
//! - `proxy` - Adapter from a live engine to the trigger registry's `ScrollSource`
//!
//! # Usage
//!
//! ```ignore
//! use pageturn_core::scroll::{backend_for, ScrollConfigExt, ScrollProxy};
//!
//! let config = ScrollConfig::default();
//! let mut backend = backend_for(config.backend);
//! let mut handle = backend.create(&container, &config.scroll_options())?;
//! handle.enable();
//! let mut proxy = ScrollProxy::bind(handle, config.pin_strategy)?;
//!
//! // Each frame
//! let notices = proxy.advance(config.animation_tick_duration());
//! ```

// L4 Atomic Layer
pub mod config;
pub mod easing;
pub mod engine;
pub mod timing;

// L3 Molecular Layer
pub mod eased;
pub mod inertial;
pub mod proxy;

// Re-exports for convenient access
pub use config::{ScrollConfig, ScrollConfigExt};
pub use eased::{EasedScroll, EasedScrollBackend};
pub use easing::{EasingType, EasingTypeExt};
pub use engine::{
    backend_for, Rect, ScrollBackend, ScrollCallback, ScrollEvent, ScrollEventKind, ScrollHandle,
    ScrollOptions, Viewport,
};
pub use inertial::{InertialScroll, InertialScrollBackend};
pub use proxy::{Notices, ScrollProxy, ScrollSource};
