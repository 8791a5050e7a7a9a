use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result};

/// Navigation state machine.
///
/// `Idle → Leaving → Swapping → BeforeEnter → Entering → Idle`, with
/// `Aborted` reachable from any other phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Leaving,
    Swapping,
    BeforeEnter,
    Entering,
    Aborted,
}

impl Phase {
    /// The phase that follows on success
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Leaving),
            Phase::Leaving => Some(Phase::Swapping),
            Phase::Swapping => Some(Phase::BeforeEnter),
            Phase::BeforeEnter => Some(Phase::Entering),
            Phase::Entering => Some(Phase::Idle),
            Phase::Aborted => None,
        }
    }

    pub fn can_advance_to(&self, to: Phase) -> bool {
        match to {
            Phase::Aborted => *self != Phase::Aborted,
            _ => self.next() == Some(to),
        }
    }

    /// A transition is in flight
    pub fn is_busy(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Aborted)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Leaving => "leaving",
            Phase::Swapping => "swapping",
            Phase::BeforeEnter => "before-enter",
            Phase::Entering => "entering",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// One in-flight navigation
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub id: Uuid,
    /// `None` for the initial boot
    pub from: Option<String>,
    pub to: String,
    pub transition: String,
    phase: Phase,
    visited: Vec<Phase>,
}

impl TransitionRecord {
    pub fn new(from: Option<String>, to: impl Into<String>, transition: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to: to.into(),
            transition: transition.into(),
            phase: Phase::Idle,
            visited: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase entered so far, starting with `Idle`
    pub fn visited(&self) -> &[Phase] {
        &self.visited
    }

    /// Move to `to`, refusing anything but the next phase or `Aborted`
    pub fn advance(&mut self, to: Phase) -> Result<()> {
        if !self.phase.can_advance_to(to) {
            return Err(Error::PhaseOrder {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        self.visited.push(to);
        Ok(())
    }

    pub fn abort(&mut self) {
        if self.phase != Phase::Aborted {
            self.phase = Phase::Aborted;
            self.visited.push(Phase::Aborted);
        }
    }

    /// Went all the way round back to `Idle`
    pub fn is_complete(&self) -> bool {
        self.visited.len() > 1 && self.phase == Phase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut record = TransitionRecord::new(Some("home".into()), "about", "from-home");
        for phase in [
            Phase::Leaving,
            Phase::Swapping,
            Phase::BeforeEnter,
            Phase::Entering,
            Phase::Idle,
        ] {
            record.advance(phase).unwrap();
        }
        assert!(record.is_complete());
        assert_eq!(record.visited().len(), 6);
    }

    #[test]
    fn test_skipping_a_phase_is_refused() {
        let mut record = TransitionRecord::new(None, "home", "identity");
        record.advance(Phase::Leaving).unwrap();
        let err = record.advance(Phase::BeforeEnter).unwrap_err();
        assert!(matches!(
            err,
            Error::PhaseOrder {
                from: Phase::Leaving,
                to: Phase::BeforeEnter
            }
        ));
        assert_eq!(record.phase(), Phase::Leaving);
    }

    #[test]
    fn test_abort_from_anywhere_once() {
        let mut record = TransitionRecord::new(None, "home", "identity");
        record.advance(Phase::Leaving).unwrap();
        record.abort();
        record.abort();
        assert_eq!(record.visited(), [Phase::Idle, Phase::Leaving, Phase::Aborted]);
        assert!(record.advance(Phase::Idle).is_err());
        assert!(!record.is_complete());
    }

    #[test]
    fn test_busy() {
        assert!(!Phase::Idle.is_busy());
        assert!(Phase::Swapping.is_busy());
        assert!(!Phase::Aborted.is_busy());
    }
}
