use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{AppConfig, SwapMode, TransitionConfig, TransitionStyle};
use crate::{Error, Result};

/// Name of the built-in instant swap
pub const IDENTITY: &str = "identity";

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionDef {
    pub name: String,
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub style: TransitionStyle,
    pub fade: Duration,
    pub cover: Duration,
    pub settle: Duration,
    pub swap: SwapMode,
}

impl TransitionDef {
    /// Instant swap without overlay
    pub fn identity() -> Self {
        Self {
            name: IDENTITY.to_string(),
            from: Vec::new(),
            to: Vec::new(),
            style: TransitionStyle::Instant,
            fade: Duration::ZERO,
            cover: Duration::ZERO,
            settle: Duration::ZERO,
            swap: SwapMode::Detach,
        }
    }

    /// Specificity of this definition for a navigation, `None` if it does
    /// not apply. An empty side matches anything and adds nothing.
    fn score(&self, from: &str, to: &str) -> Option<u8> {
        let side = |names: &[String], namespace: &str| -> Option<u8> {
            if names.is_empty() {
                Some(0)
            } else if names.iter().any(|n| n == namespace) {
                Some(1)
            } else {
                None
            }
        };
        Some(side(&self.from, from)? + side(&self.to, to)?)
    }
}

impl From<&TransitionConfig> for TransitionDef {
    fn from(config: &TransitionConfig) -> Self {
        Self {
            name: config.name.clone(),
            from: config.from.clone(),
            to: config.to.clone(),
            style: config.style,
            fade: Duration::from_millis(config.fade_ms),
            cover: Duration::from_millis(config.cover_ms),
            settle: Duration::from_millis(config.settle_ms),
            swap: config.swap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// First load, nothing to leave
    Boot,
    Matched,
    /// Nothing matched; the configured default was used
    Default,
    /// Nothing matched and no default is configured
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub def: TransitionDef,
    pub reason: SelectionReason,
}

/// Transition definitions in declaration order
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    defs: Vec<TransitionDef>,
    default: Option<usize>,
}

impl TransitionTable {
    pub fn new(defs: Vec<TransitionDef>, default: Option<&str>) -> Result<Self> {
        let default = match default {
            Some(name) => Some(
                defs.iter()
                    .position(|d| d.name == name)
                    .ok_or_else(|| Error::Config(format!("unknown default transition '{}'", name)))?,
            ),
            None => None,
        };
        Ok(Self { defs, default })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let defs = config.transitions.iter().map(TransitionDef::from).collect();
        Self::new(defs, config.default_transition.as_deref())
    }

    pub fn defs(&self) -> &[TransitionDef] {
        &self.defs
    }

    /// Pick the transition for `from → to`.
    ///
    /// The highest-scoring definition wins and ties go to the one declared
    /// first. Without a match the configured default is used, then the
    /// identity transition.
    pub fn select(&self, from: Option<&str>, to: &str) -> Selection {
        let Some(from) = from else {
            return Selection {
                def: TransitionDef::identity(),
                reason: SelectionReason::Boot,
            };
        };

        let mut best: Option<(u8, &TransitionDef)> = None;
        for def in &self.defs {
            if let Some(score) = def.score(from, to) {
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, def));
                }
            }
        }

        if let Some((score, def)) = best {
            debug!(from, to, transition = %def.name, score, "Transition matched");
            return Selection {
                def: def.clone(),
                reason: SelectionReason::Matched,
            };
        }

        if let Some(def) = self.default.and_then(|i| self.defs.get(i)) {
            debug!(from, to, transition = %def.name, "Using default transition");
            return Selection {
                def: def.clone(),
                reason: SelectionReason::Default,
            };
        }

        let err = Error::TransitionNotFound {
            from: from.to_string(),
            to: to.to_string(),
        };
        warn!("{}; swapping instantly", err);
        Selection {
            def: TransitionDef::identity(),
            reason: SelectionReason::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(configs: Vec<TransitionConfig>, default: Option<&str>) -> TransitionTable {
        TransitionTable::new(configs.iter().map(TransitionDef::from).collect(), default).unwrap()
    }

    #[test]
    fn test_specific_match_then_wildcard_default() {
        let table = table(
            vec![
                TransitionConfig::named("A").from_namespaces(["home"]).to_namespaces(["about"]),
                TransitionConfig::named("default"),
            ],
            Some("default"),
        );

        assert_eq!(table.select(Some("home"), "about").def.name, "A");
        assert_eq!(table.select(Some("about"), "contact").def.name, "default");
    }

    #[test]
    fn test_more_specific_beats_earlier() {
        let table = table(
            vec![
                TransitionConfig::named("from-home").from_namespaces(["home"]),
                TransitionConfig::named("home-to-about")
                    .from_namespaces(["home"])
                    .to_namespaces(["about"]),
            ],
            None,
        );
        assert_eq!(table.select(Some("home"), "about").def.name, "home-to-about");
        assert_eq!(table.select(Some("home"), "work").def.name, "from-home");
    }

    #[test]
    fn test_ties_resolve_to_declaration_order() {
        let table = table(
            vec![
                TransitionConfig::named("first").to_namespaces(["about"]),
                TransitionConfig::named("second").from_namespaces(["home"]),
            ],
            None,
        );
        assert_eq!(table.select(Some("home"), "about").def.name, "first");
    }

    #[test]
    fn test_default_used_when_nothing_matches() {
        let table = table(
            vec![
                TransitionConfig::named("from-home").from_namespaces(["home"]),
                TransitionConfig::named("slow-fade")
                    .from_namespaces(["gallery"])
                    .with_style(TransitionStyle::Fade),
            ],
            Some("slow-fade"),
        );
        let selection = table.select(Some("about"), "home");
        assert_eq!(selection.def.name, "slow-fade");
        assert_eq!(selection.reason, SelectionReason::Default);
    }

    #[test]
    fn test_fallback_to_identity() {
        let table = table(vec![TransitionConfig::named("from-home").from_namespaces(["home"])], None);
        let selection = table.select(Some("about"), "contact");
        assert_eq!(selection.def.name, IDENTITY);
        assert_eq!(selection.def.style, TransitionStyle::Instant);
        assert_eq!(selection.reason, SelectionReason::Fallback);
    }

    #[test]
    fn test_boot_is_always_identity() {
        let table = table(vec![TransitionConfig::named("everything")], None);
        assert_eq!(table.select(None, "home").reason, SelectionReason::Boot);
    }

    #[test]
    fn test_unknown_default_rejected() {
        assert!(TransitionTable::new(Vec::new(), Some("missing")).is_err());
    }
}
