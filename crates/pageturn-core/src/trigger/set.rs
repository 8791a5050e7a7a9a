use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::page::{Container, ContainerId, PageSurface};
use crate::scroll::ScrollSource;
use crate::{Error, Result};

use super::engine::{TriggerCallback, TriggerEngine, TriggerEvent, TriggerId, TriggerSpec};

/// The triggers registered for the currently bound container.
///
/// Every handle here belongs to `container`; registering against any other
/// container is refused.
pub struct TriggerSet {
    engine: Box<dyn TriggerEngine>,
    container: Option<ContainerId>,
    handles: Vec<(TriggerId, String)>,
    event_tx: Option<mpsc::UnboundedSender<TriggerEvent>>,
}

impl TriggerSet {
    pub fn new(engine: Box<dyn TriggerEngine>) -> Self {
        Self {
            engine,
            container: None,
            handles: Vec::new(),
            event_tx: None,
        }
    }

    /// Forward every crossing of declared triggers to `tx`
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<TriggerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TriggerId> + '_ {
        self.handles.iter().map(|(id, _)| *id)
    }

    /// Translation currently applied to a pinned element
    pub fn pin_offset(&self, element: &str) -> Option<f64> {
        self.handles
            .iter()
            .find(|(_, e)| e == element)
            .and_then(|(id, _)| self.engine.pin_offset(*id))
    }

    fn forwarder(&self) -> Option<TriggerCallback> {
        let tx = self.event_tx.clone()?;
        Some(Box::new(move |event: &TriggerEvent| {
            // Receiver gone means nobody is listening anymore
            let _ = tx.send(event.clone());
        }))
    }

    /// Create one trigger per declaration found in `container`
    pub fn register_all(&mut self, container: &Container) -> Result<usize> {
        self.claim(container.id)?;

        let mut created = 0;
        for (element, decl) in container.declared_triggers() {
            let mut spec = TriggerSpec::declared(container.id, element, decl);
            spec.on_enter = self.forwarder();
            spec.on_leave = self.forwarder();
            self.push(spec);
            created += 1;
        }

        debug!(container = %container.id, count = created, "Registered declared triggers");
        Ok(created)
    }

    /// Register an extra trigger on the bound container
    pub fn register(&mut self, spec: TriggerSpec) -> Result<TriggerId> {
        if self.container != Some(spec.container) {
            warn!(
                container = %spec.container,
                bound = ?self.container,
                element = %spec.element,
                "Refusing trigger for a container that is not bound"
            );
            return Err(Error::DanglingTrigger {
                container: spec.container,
            });
        }
        Ok(self.push(spec))
    }

    fn claim(&mut self, container: ContainerId) -> Result<()> {
        match self.container {
            Some(owner) if owner != container && !self.handles.is_empty() => {
                Err(Error::DanglingTrigger { container: owner })
            }
            _ => {
                self.container = Some(container);
                Ok(())
            }
        }
    }

    fn push(&mut self, spec: TriggerSpec) -> TriggerId {
        let element = spec.element.clone();
        let id = self.engine.create(spec);
        self.handles.push((id, element));
        id
    }

    /// Kill every trigger in the set. Calling this on an empty set is a no-op.
    pub fn kill_all(&mut self) -> usize {
        let mut killed = 0;
        for (id, _) in self.handles.drain(..) {
            if self.engine.kill(id) {
                killed += 1;
            }
        }
        self.container = None;
        killed
    }

    /// Recompute cached geometry for all live triggers.
    ///
    /// Triggers whose container is no longer attached are killed first and
    /// the number of such dangling triggers is returned.
    pub fn refresh(&mut self, source: &dyn ScrollSource, surface: &dyn PageSurface) -> usize {
        let engine = &mut self.engine;
        let before = self.handles.len();
        self.handles.retain(|(id, element)| {
            let dangling = match engine.owner(*id) {
                Some(owner) => owner != source.container() || !surface.is_attached(owner),
                None => true,
            };
            if dangling {
                let err = Error::DanglingTrigger {
                    container: engine.owner(*id).unwrap_or(source.container()),
                };
                warn!(trigger = id.get(), element = %element, "{}; killing it", err);
                engine.kill(*id);
            }
            !dangling
        });
        let pruned = before - self.handles.len();

        if self.handles.is_empty() && pruned > 0 {
            self.container = None;
        }
        self.engine.refresh_all(source);
        pruned
    }

    /// Evaluate triggers at the source's current position
    pub fn update(&mut self, source: &dyn ScrollSource) -> usize {
        self.engine.update(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, PinStrategy};
    use crate::page::{Element, MemorySurface};
    use crate::scroll::Rect;
    use crate::trigger::{Condition, Crossing, ThresholdTriggers};

    struct At(ContainerId, f64);

    impl ScrollSource for At {
        fn container(&self) -> ContainerId {
            self.0
        }

        fn position(&self) -> f64 {
            self.1
        }

        fn viewport_rect(&self) -> Rect {
            Rect {
                top: 0.0,
                left: 0.0,
                width: 1440.0,
                height: 900.0,
            }
        }

        fn pin_strategy(&self) -> PinStrategy {
            PinStrategy::Transform
        }
    }

    fn home(id: u64) -> Container {
        let config = AppConfig::default();
        Container::from_view(ContainerId::new(id), config.view("home").unwrap()).unwrap()
    }

    fn set() -> TriggerSet {
        TriggerSet::new(Box::new(ThresholdTriggers::new()))
    }

    #[test]
    fn test_register_all_creates_one_per_declaration() {
        let mut set = set();
        assert_eq!(set.register_all(&home(1)).unwrap(), 5);
        assert_eq!(set.container(), Some(ContainerId::new(1)));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_kill_all_is_idempotent() {
        let mut set = set();
        set.register_all(&home(1)).unwrap();
        assert_eq!(set.kill_all(), 5);
        assert_eq!(set.kill_all(), 0);
        assert!(set.is_empty());
        assert_eq!(set.container(), None);
    }

    #[test]
    fn test_register_all_refuses_while_other_container_live() {
        let mut set = set();
        set.register_all(&home(1)).unwrap();
        let err = set.register_all(&home(2)).unwrap_err();
        assert!(matches!(err, Error::DanglingTrigger { container } if container == ContainerId::new(1)));

        set.kill_all();
        assert_eq!(set.register_all(&home(2)).unwrap(), 5);
    }

    #[test]
    fn test_register_foreign_trigger_is_dangling() {
        let mut set = set();
        set.register_all(&home(1)).unwrap();
        let element = Element::new("stray", 0.0, 10.0);
        let spec = TriggerSpec::new(ContainerId::new(9), &element, Condition::default_end());
        assert!(matches!(
            set.register(spec),
            Err(Error::DanglingTrigger { .. })
        ));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_refresh_prunes_detached_container() {
        let mut set = set();
        let container = home(1);
        set.register_all(&container).unwrap();

        let mut surface = MemorySurface::new();
        surface.attach(&container);
        assert_eq!(set.refresh(&At(container.id, 0.0), &surface), 0);

        surface.remove(container.id);
        assert_eq!(set.refresh(&At(container.id, 0.0), &surface), 5);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_crossings_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut set = set().with_event_sender(tx);
        let container = home(1);
        set.register_all(&container).unwrap();

        set.update(&At(container.id, 0.0));
        set.update(&At(container.id, 600.0));

        let mut entered = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.crossing, Crossing::Enter);
            entered.push(event.element);
        }
        // text-split starts at 460, work-item-1 at 1060
        assert_eq!(entered, ["text-split"]);
    }
}
