use std::fmt;

use serde::Serialize;

use crate::config::ViewConfig;
use crate::trigger::Condition;
use crate::Result;

/// Identity of one rendered container. Every fetch of a view yields a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId(u64);

impl ContainerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A trigger declared on an element
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDecl {
    pub start: Condition,
    pub end: Condition,
    pub pin: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    /// Offset from the top of the container
    pub top: f64,
    pub height: f64,
    pub trigger: Option<TriggerDecl>,
}

impl Element {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
            trigger: None,
        }
    }

    pub fn with_trigger(mut self, start: Condition, end: Condition, pin: bool) -> Self {
        self.trigger = Some(TriggerDecl { start, end, pin });
        self
    }
}

/// The rendered content of one view
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: ContainerId,
    pub namespace: String,
    /// Total content height
    pub height: f64,
    pub elements: Vec<Element>,
}

impl Container {
    pub fn new(
        id: ContainerId,
        namespace: impl Into<String>,
        height: f64,
        elements: Vec<Element>,
    ) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            height,
            elements,
        }
    }

    /// Render a configured view into a container with the given identity
    pub fn from_view(id: ContainerId, view: &ViewConfig) -> Result<Self> {
        let elements = view
            .elements
            .iter()
            .map(|cfg| {
                let mut element = Element::new(&cfg.id, cfg.top, cfg.height);
                if let Some(trigger) = &cfg.trigger {
                    let start = Condition::parse(&trigger.start)?;
                    let end = match &trigger.end {
                        Some(end) => Condition::parse(end)?,
                        None => Condition::default_end(),
                    };
                    element = element.with_trigger(start, end, trigger.pin);
                }
                Ok(element)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(id, &view.namespace, view.height, elements))
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Elements carrying a trigger declaration, in document order
    pub fn declared_triggers(&self) -> impl Iterator<Item = (&Element, &TriggerDecl)> {
        self.elements
            .iter()
            .filter_map(|e| e.trigger.as_ref().map(|t| (e, t)))
    }
}
