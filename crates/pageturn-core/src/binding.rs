//! The process-wide scroll binding
//!
//! [`BindingManager`] owns the one live pairing of a scroll engine to a
//! container together with the trigger set registered against it. It is the
//! only place engines are created or destroyed.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::events::{EventSink, LifecycleEvent};
use crate::page::{Container, ContainerId, PageSurface};
use crate::scroll::{backend_for, ScrollBackend, ScrollConfigExt, ScrollOptions, ScrollProxy, Viewport};
use crate::trigger::{TriggerId, TriggerSet, TriggerSpec};
use crate::{Error, Result};

/// Counters for the binding invariant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BindingStats {
    pub live: usize,
    pub peak_live: usize,
    pub created: u64,
    pub destroyed: u64,
}

/// What one frame did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub moved: bool,
    pub resized: bool,
    pub fired: usize,
}

pub struct BindingManager {
    backend: Box<dyn ScrollBackend>,
    options: ScrollOptions,
    triggers: TriggerSet,
    binding: Option<ScrollProxy>,
    strict: bool,
    events: EventSink,
    stats: BindingStats,
}

impl BindingManager {
    pub fn new(
        backend: Box<dyn ScrollBackend>,
        options: ScrollOptions,
        triggers: TriggerSet,
        strict: bool,
    ) -> Self {
        Self {
            backend,
            options,
            triggers,
            binding: None,
            strict,
            events: EventSink::disconnected(),
            stats: BindingStats::default(),
        }
    }

    pub fn from_config(config: &AppConfig, triggers: TriggerSet) -> Self {
        Self::new(
            backend_for(config.scroll.backend),
            config.scroll.scroll_options(),
            triggers,
            config.general.strict_lifecycle,
        )
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn stats(&self) -> BindingStats {
        self.stats
    }

    pub fn bound_container(&self) -> Option<ContainerId> {
        self.binding.as_ref().map(|p| p.handle().container())
    }

    pub fn proxy(&self) -> Option<&ScrollProxy> {
        self.binding.as_ref()
    }

    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    pub fn position(&self) -> Option<f64> {
        self.binding.as_ref().map(|p| p.get_position())
    }

    pub fn pin_offset(&self, element: &str) -> Option<f64> {
        self.triggers.pin_offset(element)
    }

    /// Bind a fresh engine to `container`.
    ///
    /// A binding that is still live is a lifecycle bug: strict mode fails
    /// with [`Error::BindingConflict`], otherwise the stale binding is
    /// destroyed first.
    pub(crate) fn create(&mut self, container: &Container) -> Result<ContainerId> {
        if let Some(stale) = self.bound_container() {
            if self.strict {
                error!(stale = %stale, incoming = %container.id, "Scroll binding conflict");
                return Err(Error::BindingConflict { live: stale });
            }
            warn!(stale = %stale, incoming = %container.id, "Scroll binding conflict, destroying stale binding");
            self.events.send(LifecycleEvent::BindingConflictHealed { stale });
            self.destroy();
        }

        let mut handle = self.backend.create(container, &self.options)?;
        handle.enable();
        let proxy = ScrollProxy::bind(handle, self.options.pin_strategy)?;
        self.binding = Some(proxy);

        self.stats.created += 1;
        self.stats.live = 1;
        self.stats.peak_live = self.stats.peak_live.max(self.stats.live);
        info!(container = %container.id, namespace = %container.namespace, backend = ?self.backend.kind(), "Scroll binding created");
        self.events.send(LifecycleEvent::BindingCreated {
            container: container.id,
            live: self.stats.live,
        });
        Ok(container.id)
    }

    /// Tear the binding down: kill its triggers, destroy the engine, then
    /// drop it. No-op when nothing is bound.
    pub(crate) fn destroy(&mut self) -> Option<ContainerId> {
        let container = self.bound_container()?;

        let count = self.triggers.kill_all();
        self.events
            .send(LifecycleEvent::TriggersKilled { container, count });

        if let Some(mut proxy) = self.binding.take() {
            proxy.handle_mut().destroy();
        }

        self.stats.destroyed += 1;
        self.stats.live = 0;
        info!(container = %container, triggers = count, "Scroll binding destroyed");
        self.events
            .send(LifecycleEvent::BindingDestroyed { container });
        Some(container)
    }

    /// Register the triggers `container` declares. The container must be the
    /// bound one.
    pub(crate) fn register_all(&mut self, container: &Container) -> Result<usize> {
        if self.bound_container() != Some(container.id) {
            return Err(Error::DanglingTrigger {
                container: container.id,
            });
        }
        let count = self.triggers.register_all(container)?;
        self.events.send(LifecycleEvent::TriggersRegistered {
            container: container.id,
            count,
        });
        Ok(count)
    }

    pub(crate) fn register(&mut self, spec: TriggerSpec) -> Result<TriggerId> {
        self.triggers.register(spec)
    }

    /// Recompute trigger geometry and re-evaluate at the current position
    pub fn refresh(&mut self, surface: &dyn PageSurface) -> usize {
        let Some(proxy) = self.binding.as_ref() else {
            return 0;
        };
        let pruned = self.triggers.refresh(proxy, surface);
        self.triggers.update(proxy);
        debug!(container = %proxy.handle().container(), pruned, "Triggers refreshed");
        self.events.send(LifecycleEvent::TriggersRefreshed {
            container: proxy.handle().container(),
            pruned,
        });
        pruned
    }

    pub(crate) fn disable(&mut self) -> Option<ContainerId> {
        let proxy = self.binding.as_mut()?;
        proxy.handle_mut().disable();
        let container = proxy.handle().container();
        self.events
            .send(LifecycleEvent::EngineDisabled { container });
        Some(container)
    }

    /// Write the position through the proxy; triggers are evaluated against
    /// the new position right after the engine moved.
    pub fn set_position(&mut self, value: f64) -> bool {
        let Some(proxy) = self.binding.as_mut() else {
            return false;
        };
        if !proxy.set_position(value) {
            return false;
        }
        self.triggers.update(&*proxy);
        true
    }

    /// User scroll input
    pub fn scroll_by(&mut self, delta: f64) {
        if let Some(proxy) = self.binding.as_mut() {
            proxy.handle_mut().scroll_by(delta);
        }
    }

    pub fn resize(&mut self, viewport: Viewport, surface: &dyn PageSurface) {
        let resized = match self.binding.as_mut() {
            Some(proxy) => {
                proxy.handle_mut().resize(viewport);
                proxy.take_notices().resized
            }
            None => false,
        };
        if resized {
            self.refresh(surface);
        }
    }

    /// Advance the engine one frame, then bring triggers up to date
    pub fn frame(&mut self, dt: Duration, surface: &dyn PageSurface) -> FrameReport {
        let Some(proxy) = self.binding.as_mut() else {
            return FrameReport::default();
        };
        let notices = proxy.advance(dt);
        let mut report = FrameReport {
            moved: notices.moved,
            resized: notices.resized,
            fired: 0,
        };

        if notices.resized {
            self.refresh(surface);
        } else if notices.moved {
            if let Some(proxy) = self.binding.as_ref() {
                report.fired = self.triggers.update(proxy);
            }
        }
        report
    }
}
