use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::trigger::Condition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the transition used when no definition matches
    #[serde(default)]
    pub default_transition: Option<String>,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    /// Navigable views, one container each
    #[serde(default = "default_views")]
    pub views: Vec<ViewConfig>,
    /// Transition definitions, matched in declaration order
    #[serde(default = "default_transitions")]
    pub transitions: Vec<TransitionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_transition: None,
            general: GeneralConfig::default(),
            scroll: ScrollConfig::default(),
            navigation: NavigationConfig::default(),
            views: default_views(),
            transitions: default_transitions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Collapse every choreography duration to zero
    #[serde(default)]
    pub reduced_motion: bool,
    /// Fail on lifecycle bugs (binding conflicts) instead of self-healing
    #[serde(default = "default_strict_lifecycle")]
    pub strict_lifecycle: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reduced_motion: false,
            strict_lifecycle: default_strict_lifecycle(),
        }
    }
}

/// Easing curves shared by the scroll engines and the transition choreography.
///
/// GSAP-style names are accepted as aliases: `power2` is a cubic curve,
/// `power4` a quintic one, and a `.in` suffix selects the ease-in variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    /// Jump to the end value
    None,
    Linear,
    /// Cubic ease-out
    #[default]
    #[serde(alias = "power2", alias = "power2.out")]
    Cubic,
    /// Quintic ease-out
    #[serde(alias = "power4", alias = "power4.out")]
    Quintic,
    /// Exponential ease-out
    EaseOut,
    #[serde(alias = "power2.in")]
    CubicIn,
    #[serde(alias = "power4.in")]
    QuinticIn,
}

/// Which virtual scroll engine backs the scroll binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBackendKind {
    /// Position follows the target with per-frame linear interpolation
    #[default]
    Inertial,
    /// Fixed-duration animation along an easing curve
    Eased,
}

/// How pinned elements are kept visually fixed during virtual scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinStrategy {
    /// Counter-translate the element by the scrolled distance
    #[default]
    Transform,
    /// Native `position: fixed`
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f64,
    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Scroll engine backend
    #[serde(default)]
    pub backend: ScrollBackendKind,
    /// Animate scroll input instead of jumping
    #[serde(default = "default_true")]
    pub smooth_enabled: bool,
    /// Animation duration for the eased backend
    #[serde(default = "default_animation_duration")]
    pub animation_duration_ms: u64,
    /// Easing curve for the eased backend
    #[serde(default)]
    pub easing: EasingType,
    /// Per-frame interpolation factor for the inertial backend (0.0-1.0)
    #[serde(default = "default_inertia")]
    pub inertia: f64,
    /// Frame rate of the shared ticker
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    #[serde(default)]
    pub pin_strategy: PinStrategy,
    #[serde(default)]
    pub viewport: ViewportConfig,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            backend: ScrollBackendKind::default(),
            smooth_enabled: default_true(),
            animation_duration_ms: default_animation_duration(),
            easing: EasingType::default(),
            inertia: default_inertia(),
            animation_fps: default_animation_fps(),
            pin_strategy: PinStrategy::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

/// What happens to a navigation request that arrives mid-transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Hold at most one pending request and run it after the current one
    #[default]
    Queue,
    /// Answer with `NavigationWhileBusy` and leave state untouched
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub busy_policy: BusyPolicy,
    /// Origin that anchor hrefs are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            busy_policy: BusyPolicy::default(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub namespace: String,
    /// URL path that resolves to this view
    pub path: String,
    /// Total content height of the container
    #[serde(default = "default_view_height")]
    pub height: f64,
    #[serde(default)]
    pub elements: Vec<ElementConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementConfig {
    pub id: String,
    /// Offset from the top of the container
    pub top: f64,
    pub height: f64,
    #[serde(default)]
    pub trigger: Option<TriggerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// e.g. "top 60%"
    #[serde(default = "default_trigger_start")]
    pub start: String,
    /// Defaults to "bottom top"
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub pin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    /// Overlay wipe plus container fades
    #[default]
    Wipe,
    /// Container fades only
    Fade,
    /// No choreography
    Instant,
}

/// How the outgoing container leaves the document at swap time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapMode {
    /// Remove it right away
    Detach,
    /// Hide it and remove it once the entry choreography has finished
    #[default]
    Hide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    pub name: String,
    /// Source namespaces; empty matches any
    #[serde(default)]
    pub from: Vec<String>,
    /// Destination namespaces; empty matches any
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub style: TransitionStyle,
    /// Container fade duration
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
    /// Overlay sweep between flat and bowed
    #[serde(default = "default_cover_ms")]
    pub cover_ms: u64,
    /// Overlay sweep between bowed and full
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default)]
    pub swap: SwapMode,
}

impl TransitionConfig {
    /// A wildcard wipe definition with default timings
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: Vec::new(),
            to: Vec::new(),
            style: TransitionStyle::default(),
            fade_ms: default_fade_ms(),
            cover_ms: default_cover_ms(),
            settle_ms: default_settle_ms(),
            swap: SwapMode::default(),
        }
    }

    pub fn from_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_style(mut self, style: TransitionStyle) -> Self {
        self.style = style;
        self
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_strict_lifecycle() -> bool {
    cfg!(debug_assertions)
}

fn default_true() -> bool {
    true
}

fn default_animation_duration() -> u64 {
    150
}

fn default_inertia() -> f64 {
    0.075
}

fn default_animation_fps() -> u32 {
    60
}

fn default_viewport_width() -> f64 {
    1440.0
}

fn default_viewport_height() -> f64 {
    900.0
}

fn default_base_url() -> String {
    "http://localhost/".to_string()
}

fn default_view_height() -> f64 {
    2000.0
}

fn default_trigger_start() -> String {
    "top 60%".to_string()
}

fn default_fade_ms() -> u64 {
    500
}

fn default_cover_ms() -> u64 {
    800
}

fn default_settle_ms() -> u64 {
    300
}

fn element(id: &str, top: f64, height: f64, start: Option<&str>, pin: bool) -> ElementConfig {
    ElementConfig {
        id: id.to_string(),
        top,
        height,
        trigger: start.map(|start| TriggerConfig {
            start: start.to_string(),
            end: None,
            pin,
        }),
    }
}

fn default_views() -> Vec<ViewConfig> {
    vec![
        ViewConfig {
            namespace: "home".to_string(),
            path: "/".to_string(),
            height: 4200.0,
            elements: vec![
                element("intro-title", 120.0, 480.0, None, false),
                element("text-split", 1000.0, 400.0, Some("top 60%"), false),
                element("work-item-1", 1600.0, 300.0, Some("top 60%"), false),
                element("work-item-2", 1950.0, 300.0, Some("top 60%"), false),
                element("work-item-3", 2300.0, 300.0, Some("top 60%"), false),
                element("about", 2900.0, 900.0, Some("top 60%"), true),
            ],
        },
        ViewConfig {
            namespace: "about".to_string(),
            path: "/about".to_string(),
            height: 2000.0,
            elements: vec![element("about-copy", 200.0, 600.0, Some("top 60%"), false)],
        },
    ]
}

fn default_transitions() -> Vec<TransitionConfig> {
    vec![
        TransitionConfig::named("from-home").from_namespaces(["home"]),
        TransitionConfig::named("from-about").from_namespaces(["about"]),
    ]
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/pageturn/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("pageturn")
            .join("config.toml")
    }

    pub fn view(&self, namespace: &str) -> Option<&ViewConfig> {
        self.views.iter().find(|v| v.namespace == namespace)
    }

    /// Check cross-references that serde cannot express
    pub fn validate(&self) -> crate::Result<()> {
        let mut namespaces = HashSet::new();
        let mut paths = HashSet::new();
        for view in &self.views {
            if !namespaces.insert(view.namespace.as_str()) {
                return Err(crate::Error::Config(format!(
                    "duplicate view namespace '{}'",
                    view.namespace
                )));
            }
            if !paths.insert(view.path.as_str()) {
                return Err(crate::Error::Config(format!(
                    "duplicate view path '{}'",
                    view.path
                )));
            }
            for element in &view.elements {
                if let Some(trigger) = &element.trigger {
                    Condition::parse(&trigger.start)?;
                    if let Some(end) = &trigger.end {
                        Condition::parse(end)?;
                    }
                }
            }
        }

        let mut names = HashSet::new();
        for transition in &self.transitions {
            if !names.insert(transition.name.as_str()) {
                return Err(crate::Error::Config(format!(
                    "duplicate transition name '{}'",
                    transition.name
                )));
            }
        }

        if let Some(default) = &self.default_transition {
            if !names.contains(default.as_str()) {
                return Err(crate::Error::Config(format!(
                    "default_transition '{}' is not a declared transition",
                    default
                )));
            }
        }

        if self.scroll.animation_fps == 0 {
            return Err(crate::Error::Config(
                "scroll.animation_fps must be greater than zero".to_string(),
            ));
        }

        url::Url::parse(&self.navigation.base_url)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.views.len(), 2);
        assert_eq!(config.transitions[0].name, "from-home");
        assert_eq!(config.navigation.busy_policy, BusyPolicy::Queue);
        assert_eq!(config.scroll.backend, ScrollBackendKind::Inertial);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [general]
            reduced_motion = true

            [navigation]
            busy_policy = "reject"
            "#,
        )
        .unwrap();
        assert!(config.general.reduced_motion);
        assert_eq!(config.navigation.busy_policy, BusyPolicy::Reject);
        assert_eq!(config.scroll.animation_fps, 60);
        assert_eq!(config.views[0].namespace, "home");
    }

    #[test]
    fn test_gsap_easing_aliases() {
        let config = AppConfig::from_toml_str(
            r#"
            [scroll]
            easing = "power4.in"
            "#,
        )
        .unwrap();
        assert_eq!(config.scroll.easing, EasingType::QuinticIn);

        let config = AppConfig::from_toml_str("[scroll]\neasing = \"power2\"\n").unwrap();
        assert_eq!(config.scroll.easing, EasingType::Cubic);
    }

    #[test]
    fn test_transitions_keep_declaration_order() {
        let config = AppConfig::from_toml_str(
            r#"
            [[transitions]]
            name = "A"
            from = ["home"]
            to = ["about"]

            [[transitions]]
            name = "default"
            style = "instant"
            "#,
        )
        .unwrap();
        let names: Vec<_> = config.transitions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["A", "default"]);
        assert_eq!(config.transitions[1].style, TransitionStyle::Instant);
        assert!(config.transitions[1].from.is_empty());
    }

    #[test]
    fn test_unknown_default_transition_rejected() {
        let err = AppConfig::from_toml_str("default_transition = \"missing\"\n").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_bad_trigger_condition_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [[views]]
            namespace = "home"
            path = "/"

            [[views.elements]]
            id = "hero"
            top = 0.0
            height = 100.0
            trigger = { start = "sideways 60%" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidCondition(_)));
    }

    #[test]
    fn test_duplicate_view_path_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [[views]]
            namespace = "home"
            path = "/"

            [[views]]
            namespace = "landing"
            path = "/"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
