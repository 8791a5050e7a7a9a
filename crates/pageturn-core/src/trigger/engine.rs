//! The scroll-trigger capability and its in-memory implementation

use serde::Serialize;
use tracing::debug;

use crate::config::PinStrategy;
use crate::page::{ContainerId, Element, TriggerDecl};
use crate::scroll::ScrollSource;

use super::condition::Condition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TriggerId(u64);

impl TriggerId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Which threshold was crossed, and in which direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    /// Scrolling down past the start
    Enter,
    /// Scrolling down past the end
    Leave,
    /// Scrolling up past the end
    EnterBack,
    /// Scrolling up past the start
    LeaveBack,
}

impl Crossing {
    pub fn is_enter(&self) -> bool {
        matches!(self, Crossing::Enter | Crossing::EnterBack)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEvent {
    pub trigger: TriggerId,
    pub container: ContainerId,
    pub element: String,
    pub crossing: Crossing,
    pub position: f64,
}

pub type TriggerCallback = Box<dyn FnMut(&TriggerEvent)>;

/// Everything needed to create one trigger
pub struct TriggerSpec {
    pub container: ContainerId,
    pub element: String,
    pub element_top: f64,
    pub element_height: f64,
    pub start: Condition,
    pub end: Condition,
    pub pin: bool,
    pub on_enter: Option<TriggerCallback>,
    pub on_leave: Option<TriggerCallback>,
}

impl TriggerSpec {
    pub fn new(container: ContainerId, element: &Element, start: Condition) -> Self {
        Self {
            container,
            element: element.id.clone(),
            element_top: element.top,
            element_height: element.height,
            start,
            end: Condition::default_end(),
            pin: false,
            on_enter: None,
            on_leave: None,
        }
    }

    /// Build from an element's declaration
    pub fn declared(container: ContainerId, element: &Element, decl: &TriggerDecl) -> Self {
        Self {
            end: decl.end,
            pin: decl.pin,
            ..Self::new(container, element, decl.start)
        }
    }

    pub fn on_enter(mut self, callback: TriggerCallback) -> Self {
        self.on_enter = Some(callback);
        self
    }

    pub fn on_leave(mut self, callback: TriggerCallback) -> Self {
        self.on_leave = Some(callback);
        self
    }
}

/// A scroll-triggered animation registry
pub trait TriggerEngine {
    fn create(&mut self, spec: TriggerSpec) -> TriggerId;

    /// Remove one trigger. Returns `false` if it was already gone.
    fn kill(&mut self, id: TriggerId) -> bool;

    /// Recompute cached start/end positions against the current geometry
    fn refresh_all(&mut self, source: &dyn ScrollSource);

    /// Evaluate triggers owned by the source's container at its current
    /// position. Returns how many crossings fired.
    fn update(&mut self, source: &dyn ScrollSource) -> usize;

    fn live(&self) -> usize;

    fn owner(&self, id: TriggerId) -> Option<ContainerId>;

    /// Translation applied to a pinned element, if any
    fn pin_offset(&self, id: TriggerId) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Before,
    Active,
    After,
}

struct LiveTrigger {
    id: TriggerId,
    spec: TriggerSpec,
    /// Cached threshold positions, `None` until the first refresh
    range: Option<(f64, f64)>,
    zone: Zone,
    pin_offset: Option<f64>,
}

impl LiveTrigger {
    fn measure(&mut self, viewport_height: f64) {
        let s = &self.spec;
        let start = s.start.scroll_position(s.element_top, s.element_height, viewport_height);
        let end = s.end.scroll_position(s.element_top, s.element_height, viewport_height);
        self.range = Some((start, end.max(start)));
    }

    fn fire(&mut self, crossing: Crossing, position: f64) {
        let event = TriggerEvent {
            trigger: self.id,
            container: self.spec.container,
            element: self.spec.element.clone(),
            crossing,
            position,
        };
        let callback = if crossing.is_enter() {
            self.spec.on_enter.as_mut()
        } else {
            self.spec.on_leave.as_mut()
        };
        if let Some(callback) = callback {
            callback(&event);
        }
    }
}

/// Threshold-crossing registry evaluated against a [`ScrollSource`]
#[derive(Default)]
pub struct ThresholdTriggers {
    triggers: Vec<LiveTrigger>,
    next_id: u64,
}

impl ThresholdTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, id: TriggerId) -> Option<&LiveTrigger> {
        self.triggers.iter().find(|t| t.id == id)
    }
}

impl TriggerEngine for ThresholdTriggers {
    fn create(&mut self, spec: TriggerSpec) -> TriggerId {
        self.next_id += 1;
        let id = TriggerId(self.next_id);
        debug!(trigger = id.get(), element = %spec.element, start = %spec.start, "Trigger created");
        self.triggers.push(LiveTrigger {
            id,
            spec,
            range: None,
            zone: Zone::Before,
            pin_offset: None,
        });
        id
    }

    fn kill(&mut self, id: TriggerId) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.id != id);
        self.triggers.len() != before
    }

    fn refresh_all(&mut self, source: &dyn ScrollSource) {
        let viewport_height = source.viewport_rect().height;
        for trigger in self
            .triggers
            .iter_mut()
            .filter(|t| t.spec.container == source.container())
        {
            trigger.measure(viewport_height);
        }
    }

    fn update(&mut self, source: &dyn ScrollSource) -> usize {
        let position = source.position();
        let viewport_height = source.viewport_rect().height;
        let pin_strategy = source.pin_strategy();
        let mut fired = 0;

        for trigger in self
            .triggers
            .iter_mut()
            .filter(|t| t.spec.container == source.container())
        {
            if trigger.range.is_none() {
                trigger.measure(viewport_height);
            }
            let Some((start, end)) = trigger.range else {
                continue;
            };

            let zone = if position < start {
                Zone::Before
            } else if position > end {
                Zone::After
            } else {
                Zone::Active
            };

            let crossings: &[Crossing] = match (trigger.zone, zone) {
                (Zone::Before, Zone::Active) => &[Crossing::Enter],
                (Zone::Before, Zone::After) => &[Crossing::Enter, Crossing::Leave],
                (Zone::Active, Zone::After) => &[Crossing::Leave],
                (Zone::After, Zone::Active) => &[Crossing::EnterBack],
                (Zone::After, Zone::Before) => &[Crossing::EnterBack, Crossing::LeaveBack],
                (Zone::Active, Zone::Before) => &[Crossing::LeaveBack],
                _ => &[],
            };
            trigger.zone = zone;
            for crossing in crossings {
                trigger.fire(*crossing, position);
                fired += 1;
            }

            trigger.pin_offset = match (trigger.spec.pin, pin_strategy) {
                (true, PinStrategy::Transform) => Some(match zone {
                    Zone::Before => 0.0,
                    Zone::Active => position - start,
                    Zone::After => end - start,
                }),
                _ => None,
            };
        }

        fired
    }

    fn live(&self) -> usize {
        self.triggers.len()
    }

    fn owner(&self, id: TriggerId) -> Option<ContainerId> {
        self.find(id).map(|t| t.spec.container)
    }

    fn pin_offset(&self, id: TriggerId) -> Option<f64> {
        self.find(id).and_then(|t| t.pin_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fixed-position scroll source
    struct At {
        container: ContainerId,
        position: f64,
        pin: PinStrategy,
    }

    impl ScrollSource for At {
        fn container(&self) -> ContainerId {
            self.container
        }

        fn position(&self) -> f64 {
            self.position
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
            self.pin
        }
    }

    fn at(position: f64) -> At {
        At {
            container: ContainerId::new(1),
            position,
            pin: PinStrategy::Transform,
        }
    }

    fn recorded(engine: &mut ThresholdTriggers, pin: bool) -> (TriggerId, Rc<RefCell<Vec<Crossing>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (enter_log, leave_log) = (log.clone(), log.clone());
        // start 460, end 1400
        let element = Element::new("text-split", 1000.0, 400.0);
        let mut spec = TriggerSpec::new(ContainerId::new(1), &element, Condition::parse("top 60%").unwrap())
            .on_enter(Box::new(move |e: &TriggerEvent| enter_log.borrow_mut().push(e.crossing)))
            .on_leave(Box::new(move |e: &TriggerEvent| leave_log.borrow_mut().push(e.crossing)));
        spec.pin = pin;
        (engine.create(spec), log)
    }

    #[test]
    fn test_crossings_in_both_directions() {
        let mut engine = ThresholdTriggers::new();
        let (_, log) = recorded(&mut engine, false);

        for position in [0.0, 500.0, 1500.0, 1000.0, 100.0] {
            engine.update(&at(position));
        }
        assert_eq!(
            *log.borrow(),
            [Crossing::Enter, Crossing::Leave, Crossing::EnterBack, Crossing::LeaveBack]
        );
    }

    #[test]
    fn test_jump_over_range_fires_both() {
        let mut engine = ThresholdTriggers::new();
        let (_, log) = recorded(&mut engine, false);
        assert_eq!(engine.update(&at(2000.0)), 2);
        assert_eq!(*log.borrow(), [Crossing::Enter, Crossing::Leave]);
    }

    #[test]
    fn test_other_container_is_ignored() {
        let mut engine = ThresholdTriggers::new();
        let (_, log) = recorded(&mut engine, false);
        let foreign = At {
            container: ContainerId::new(2),
            position: 800.0,
            pin: PinStrategy::Transform,
        };
        assert_eq!(engine.update(&foreign), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_pin_offset_by_strategy() {
        let mut engine = ThresholdTriggers::new();
        let (id, _) = recorded(&mut engine, true);

        engine.update(&at(760.0));
        assert_eq!(engine.pin_offset(id), Some(300.0));
        engine.update(&at(5000.0));
        assert_eq!(engine.pin_offset(id), Some(940.0));

        let fixed = At {
            pin: PinStrategy::Fixed,
            ..at(760.0)
        };
        engine.update(&fixed);
        assert_eq!(engine.pin_offset(id), None);
    }

    #[test]
    fn test_kill_reports_presence() {
        let mut engine = ThresholdTriggers::new();
        let (id, _) = recorded(&mut engine, false);
        assert_eq!(engine.owner(id), Some(ContainerId::new(1)));
        assert!(engine.kill(id));
        assert!(!engine.kill(id));
        assert_eq!(engine.live(), 0);
        assert_eq!(engine.owner(id), None);
    }
}
