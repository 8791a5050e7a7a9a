use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::page::ContainerId;
use crate::transition::{Phase, Stage};

/// Observable lifecycle steps, in the order they happen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    NavigationQueued { to: String },
    NavigationRejected { to: String },
    TransitionSelected {
        record: Uuid,
        from: Option<String>,
        to: String,
        transition: String,
    },
    PhaseEntered { record: Uuid, phase: Phase },
    EngineDisabled { container: ContainerId },
    DomSwapped {
        outgoing: Option<ContainerId>,
        incoming: ContainerId,
    },
    ContainerReleased { container: ContainerId },
    TriggersKilled { container: ContainerId, count: usize },
    TriggersRegistered { container: ContainerId, count: usize },
    TriggersRefreshed { container: ContainerId, pruned: usize },
    BindingDestroyed { container: ContainerId },
    BindingCreated { container: ContainerId, live: usize },
    /// A stale binding was found at creation time and torn down
    BindingConflictHealed { stale: ContainerId },
    NativeScrollReset,
    ChoreographyStarted { record: Uuid, stage: Stage, duration_ms: u64 },
    ChoreographyFinished { record: Uuid, stage: Stage },
    TransitionCompleted { record: Uuid, to: String, elapsed_ms: u64 },
    Aborted { record: Uuid, reason: String },
    Reloaded { namespace: String },
}

/// Optional channel to whoever observes the lifecycle
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<LifecycleEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn send(&self, event: LifecycleEvent) {
        if let Some(ref tx) = self.tx {
            if tx.send(event).is_err() {
                warn!("Failed to send lifecycle event: receiver dropped");
            }
        }
    }
}
