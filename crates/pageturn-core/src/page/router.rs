//! Anchor interception
//!
//! Decides whether activating a link should become an orchestrated
//! navigation or be left to the browser.

use url::Url;

use crate::config::{AppConfig, ViewConfig};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Same-origin link to a configured view
    View { namespace: String, url: Url },
    /// Let the browser handle it
    Passthrough(String),
}

impl LinkTarget {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            LinkTarget::View { namespace, .. } => Some(namespace),
            LinkTarget::Passthrough(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkResolver {
    base: Url,
    /// (normalized path, namespace)
    routes: Vec<(String, String)>,
}

impl LinkResolver {
    pub fn new(base_url: &str, views: &[ViewConfig]) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let routes = views
            .iter()
            .map(|v| (normalize_path(&v.path), v.namespace.clone()))
            .collect();
        Ok(Self { base, routes })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.navigation.base_url, &config.views)
    }

    /// Resolve an anchor href
    pub fn resolve(&self, href: &str) -> Result<LinkTarget> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return Ok(LinkTarget::Passthrough(href.to_string()));
        }

        let url = self.base.join(href)?;
        if url.origin() != self.base.origin() {
            return Ok(LinkTarget::Passthrough(url.to_string()));
        }

        let path = normalize_path(url.path());
        match self.routes.iter().find(|(route, _)| *route == path) {
            Some((_, namespace)) => Ok(LinkTarget::View {
                namespace: namespace.clone(),
                url,
            }),
            None => Ok(LinkTarget::Passthrough(url.to_string())),
        }
    }

    pub fn path_for(&self, namespace: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(_, ns)| ns == namespace)
            .map(|(path, _)| path.as_str())
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
