use crate::binding::BindingManager;
use crate::page::Container;
use crate::trigger::{Condition, TriggerId, TriggerSpec};
use crate::{Error, Result};

/// What a view's `on_enter` hook may touch: the incoming container and the
/// trigger set bound to it
pub struct ViewContext<'a> {
    container: &'a Container,
    binding: &'a mut BindingManager,
}

impl<'a> ViewContext<'a> {
    pub(crate) fn new(container: &'a Container, binding: &'a mut BindingManager) -> Self {
        Self { container, binding }
    }

    pub fn container(&self) -> &Container {
        self.container
    }

    pub fn namespace(&self) -> &str {
        &self.container.namespace
    }

    pub fn position(&self) -> f64 {
        self.binding.position().unwrap_or(0.0)
    }

    /// Start building a trigger on one of the container's elements
    pub fn trigger(&self, element: &str, start: &str) -> Result<TriggerSpec> {
        let found = self
            .container
            .element(element)
            .ok_or_else(|| Error::Other(format!("no element '{}' in {}", element, self.container.namespace)))?;
        Ok(TriggerSpec::new(self.container.id, found, Condition::parse(start)?))
    }

    /// Register an extra trigger; only the incoming container is accepted
    pub fn register(&mut self, spec: TriggerSpec) -> Result<TriggerId> {
        self.binding.register(spec)
    }
}

/// Runs inside `BeforeEnter`, after declared triggers are registered
pub type ViewHook = Box<dyn FnMut(&mut ViewContext<'_>) -> Result<()>>;
