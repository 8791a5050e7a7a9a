use thiserror::Error;

use crate::page::ContainerId;
use crate::transition::Phase;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Scroll binding conflict: container {live} is still bound")]
    BindingConflict { live: ContainerId },

    #[error("Dangling trigger: container {container} is no longer attached")]
    DanglingTrigger { container: ContainerId },

    #[error("No transition matches {from} -> {to} and no default is configured")]
    TransitionNotFound { from: String, to: String },

    #[error("Navigation to {0} rejected: a transition is already in progress")]
    NavigationWhileBusy(String),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Invalid trigger condition: {0}")]
    InvalidCondition(String),

    #[error("Scroll source does not satisfy the proxy contract: {0}")]
    NonConformingScrollSource(String),

    #[error("Illegal phase change {from:?} -> {to:?}")]
    PhaseOrder { from: Phase, to: Phase },

    #[error("Scroll engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Errors raised by scroll/trigger resources that the orchestrator recovers
    /// from locally instead of aborting the transition.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DanglingTrigger { .. } | Error::TransitionNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
