use std::cell::Cell;

use tracing::debug;

use crate::config::{AppConfig, ViewConfig};
use crate::{Error, Result};

use super::container::{Container, ContainerId};

/// Produces the container for a view on navigation
#[async_trait::async_trait(?Send)]
pub trait ContainerSource {
    /// Render a fresh container for `namespace`
    async fn fetch(&self, namespace: &str) -> Result<Container>;

    /// Whether `namespace` can be fetched at all
    fn has_view(&self, namespace: &str) -> bool;
}

/// Renders containers from the configured view declarations
pub struct ConfigContainerSource {
    views: Vec<ViewConfig>,
    next_id: Cell<u64>,
}

impl ConfigContainerSource {
    pub fn new(views: Vec<ViewConfig>) -> Self {
        Self {
            views,
            next_id: Cell::new(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.views.clone())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|v| v.namespace.as_str())
    }
}

#[async_trait::async_trait(?Send)]
impl ContainerSource for ConfigContainerSource {
    async fn fetch(&self, namespace: &str) -> Result<Container> {
        let view = self
            .views
            .iter()
            .find(|v| v.namespace == namespace)
            .ok_or_else(|| Error::UnknownView(namespace.to_string()))?;

        let id = ContainerId::new(self.next_id.get());
        self.next_id.set(id.get() + 1);

        debug!(namespace, container = %id, "Rendered container");
        Container::from_view(id, view)
    }

    fn has_view(&self, namespace: &str) -> bool {
        self.views.iter().any(|v| v.namespace == namespace)
    }
}
