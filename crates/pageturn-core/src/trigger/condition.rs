use std::fmt;

use crate::{Error, Result};

/// A point along an element or along the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    /// Percentage of the length, measured from the top
    Percent(f64),
    /// Absolute offset from the top
    Pixels(f64),
}

impl Anchor {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "top" => Some(Anchor::Top),
            "center" => Some(Anchor::Center),
            "bottom" => Some(Anchor::Bottom),
            _ => {
                if let Some(value) = token.strip_suffix('%') {
                    value.parse().ok().filter(|v: &f64| v.is_finite()).map(Anchor::Percent)
                } else {
                    let value = token.strip_suffix("px").unwrap_or(token);
                    value.parse().ok().filter(|v: &f64| v.is_finite()).map(Anchor::Pixels)
                }
            }
        }
    }

    /// Offset of this anchor from the top of something `length` tall
    pub fn resolve(&self, length: f64) -> f64 {
        match *self {
            Anchor::Top => 0.0,
            Anchor::Center => length / 2.0,
            Anchor::Bottom => length,
            Anchor::Percent(p) => length * p / 100.0,
            Anchor::Pixels(px) => px,
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Top => write!(f, "top"),
            Anchor::Center => write!(f, "center"),
            Anchor::Bottom => write!(f, "bottom"),
            Anchor::Percent(p) => write!(f, "{}%", p),
            Anchor::Pixels(px) => write!(f, "{}px", px),
        }
    }
}

/// `"<element-anchor> <viewport-anchor>"`: the trigger fires when the
/// element anchor reaches the viewport anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl Condition {
    pub fn parse(input: &str) -> Result<Self> {
        let mut tokens = input.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(Error::InvalidCondition(format!(
                "'{}': expected \"<element> <viewport>\"",
                input
            )));
        };

        let anchor = |token: &str| {
            Anchor::parse(token).ok_or_else(|| {
                Error::InvalidCondition(format!("'{}': unknown anchor '{}'", input, token))
            })
        };

        Ok(Self {
            element: anchor(element)?,
            viewport: anchor(viewport)?,
        })
    }

    /// "bottom top": the element has scrolled fully past the viewport
    pub fn default_end() -> Self {
        Self {
            element: Anchor::Bottom,
            viewport: Anchor::Top,
        }
    }

    /// Scroll position at which the two anchors line up
    pub fn scroll_position(&self, element_top: f64, element_height: f64, viewport_height: f64) -> f64 {
        element_top + self.element.resolve(element_height) - self.viewport.resolve(viewport_height)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords_and_units() {
        let c = Condition::parse("top 60%").unwrap();
        assert_eq!(c.element, Anchor::Top);
        assert_eq!(c.viewport, Anchor::Percent(60.0));

        let c = Condition::parse("  center   120px ").unwrap();
        assert_eq!(c.element, Anchor::Center);
        assert_eq!(c.viewport, Anchor::Pixels(120.0));

        assert_eq!(Condition::parse("bottom 0").unwrap().viewport, Anchor::Pixels(0.0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "top", "top 60% extra", "sideways 60%", "top NaN%", "top abc"] {
            assert!(
                matches!(Condition::parse(input), Err(Error::InvalidCondition(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_scroll_position() {
        // Element at 1000, viewport 900 tall: "top 60%" lines up at 1000 - 540
        let start = Condition::parse("top 60%").unwrap();
        assert_eq!(start.scroll_position(1000.0, 400.0, 900.0), 460.0);

        let end = Condition::default_end();
        assert_eq!(end.scroll_position(1000.0, 400.0, 900.0), 1400.0);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let c = Condition::parse("center 25%").unwrap();
        assert_eq!(Condition::parse(&c.to_string()).unwrap(), c);
    }
}
