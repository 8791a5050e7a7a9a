use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::scroll::Viewport;
use crate::transition::Phase;
use crate::{Error, Result};

/// How a finished transition went
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionReport {
    pub record: Uuid,
    pub from: Option<String>,
    pub to: String,
    pub transition: String,
    pub phases: Vec<Phase>,
    /// Sum of the declared choreography durations that were played
    pub choreography: Duration,
    /// Wall time from selection to `Idle`
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Completed(TransitionReport),
    /// Already on the requested view
    Unchanged { namespace: String },
    /// Not a view link; left to the browser
    Passthrough { href: String },
    /// The transition failed and the page was rebuilt without animation
    Reloaded { namespace: String, reason: String },
}

impl NavigationOutcome {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            NavigationOutcome::Completed(report) => Some(&report.to),
            NavigationOutcome::Unchanged { namespace }
            | NavigationOutcome::Reloaded { namespace, .. } => Some(namespace),
            NavigationOutcome::Passthrough { .. } => None,
        }
    }
}

pub type Responder = oneshot::Sender<Result<NavigationOutcome>>;

#[derive(Debug)]
pub struct NavigationRequest {
    pub to: String,
    pub respond: Option<Responder>,
}

/// Host input for a running orchestrator
#[derive(Debug)]
pub enum Command {
    Navigate(NavigationRequest),
    /// An anchor was activated
    Follow { href: String, respond: Option<Responder> },
    Scroll { delta: f64 },
    Resize(Viewport),
}

/// A navigation that has been sent but not answered yet
pub struct PendingNavigation {
    rx: oneshot::Receiver<Result<NavigationOutcome>>,
}

impl PendingNavigation {
    pub async fn outcome(self) -> Result<NavigationOutcome> {
        self.rx
            .await
            .map_err(|_| Error::Other("orchestrator stopped before answering".to_string()))?
    }
}

/// Cloneable handle for sending commands to [`super::Orchestrator::run`]
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: mpsc::UnboundedSender<Command>,
}

impl Navigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| Error::Other("orchestrator is not running".to_string()))
    }

    /// Queue a navigation without waiting for it
    pub fn request(&self, to: impl Into<String>) -> Result<PendingNavigation> {
        let (respond, rx) = oneshot::channel();
        self.send(Command::Navigate(NavigationRequest {
            to: to.into(),
            respond: Some(respond),
        }))?;
        Ok(PendingNavigation { rx })
    }

    pub async fn navigate(&self, to: impl Into<String>) -> Result<NavigationOutcome> {
        self.request(to)?.outcome().await
    }

    pub fn follow(&self, href: impl Into<String>) -> Result<PendingNavigation> {
        let (respond, rx) = oneshot::channel();
        self.send(Command::Follow {
            href: href.into(),
            respond: Some(respond),
        })?;
        Ok(PendingNavigation { rx })
    }

    pub fn scroll_by(&self, delta: f64) -> Result<()> {
        self.send(Command::Scroll { delta })
    }

    pub fn resize(&self, viewport: Viewport) -> Result<()> {
        self.send(Command::Resize(viewport))
    }
}
