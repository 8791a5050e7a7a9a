use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::binding::{BindingManager, FrameReport};
use crate::config::{AppConfig, BusyPolicy, SwapMode};
use crate::events::{EventSink, LifecycleEvent};
use crate::page::{Container, ContainerSource, LinkResolver, LinkTarget, PageSurface};
use crate::scroll::{ScrollConfigExt, Viewport};
use crate::transition::{
    Cast, OverlayPath, OverlaySink, Phase, Timeline, TransitionDef, TransitionRecord,
    TransitionTable,
};
use crate::trigger::{ThresholdTriggers, TriggerSet};
use crate::{Error, Result};

use super::navigator::{Command, NavigationOutcome, NavigationRequest, Responder, TransitionReport};
use super::view::{ViewContext, ViewHook};

/// Drives navigation between views.
///
/// Owns the single scroll binding, the overlay and the document surface, and
/// is the only component that mutates them. Each navigation runs through
/// [`Phase`] in order; a failure in any phase ends in a hard reload.
pub struct Orchestrator {
    config: AppConfig,
    table: TransitionTable,
    links: LinkResolver,
    source: Box<dyn ContainerSource>,
    surface: Box<dyn PageSurface>,
    overlay: OverlayPath,
    binding: BindingManager,
    hooks: HashMap<String, Vec<ViewHook>>,
    phase: Phase,
    current: Option<Container>,
    /// At most one request waiting for the active transition
    pending: Option<NavigationRequest>,
    inbox: Option<mpsc::UnboundedReceiver<Command>>,
    tick: Duration,
    events: EventSink,
}

impl Orchestrator {
    pub fn new(
        config: AppConfig,
        source: Box<dyn ContainerSource>,
        surface: Box<dyn PageSurface>,
        overlay: Box<dyn OverlaySink>,
    ) -> Result<Self> {
        config.validate()?;
        let table = TransitionTable::from_config(&config)?;
        let links = LinkResolver::from_config(&config)?;
        let binding =
            BindingManager::from_config(&config, TriggerSet::new(Box::new(ThresholdTriggers::new())));
        let tick = config.scroll.animation_tick_duration();

        Ok(Self {
            config,
            table,
            links,
            source,
            surface,
            overlay: OverlayPath::new(overlay),
            binding,
            hooks: HashMap::new(),
            phase: Phase::Idle,
            current: None,
            pending: None,
            inbox: None,
            tick,
            events: EventSink::disconnected(),
        })
    }

    /// Publish lifecycle events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        let sink = EventSink::new(tx);
        self.binding = self.binding.with_events(sink.clone());
        self.events = sink;
        self
    }

    /// Replace the trigger registry. Call before `boot`.
    pub fn with_triggers(mut self, triggers: TriggerSet) -> Self {
        self.binding =
            BindingManager::from_config(&self.config, triggers).with_events(self.events.clone());
        self
    }

    /// Run `hook` every time `namespace` is entered
    pub fn on_view_enter(&mut self, namespace: impl Into<String>, hook: ViewHook) {
        self.hooks.entry(namespace.into()).or_default().push(hook);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_namespace(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.namespace.as_str())
    }

    pub fn current_container(&self) -> Option<&Container> {
        self.current.as_ref()
    }

    pub fn binding(&self) -> &BindingManager {
        &self.binding
    }

    pub fn overlay(&self) -> &OverlayPath {
        &self.overlay
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// First load of `namespace`, through the same phases as any navigation
    pub async fn boot(&mut self, namespace: &str) -> Result<NavigationOutcome> {
        if let Some(current) = &self.current {
            return Err(Error::Other(format!(
                "already booted on '{}'",
                current.namespace
            )));
        }
        self.navigate_to(namespace).await
    }

    /// Navigate to `to` and wait for the transition to finish
    pub async fn navigate_to(&mut self, to: &str) -> Result<NavigationOutcome> {
        if self.phase.is_busy() {
            return Err(Error::NavigationWhileBusy(to.to_string()));
        }
        if !self.source.has_view(to) {
            return Err(Error::UnknownView(to.to_string()));
        }
        if self.phase == Phase::Aborted {
            warn!(to, "Navigating out of an aborted state, reloading");
            let namespace = self.reload(&[to.to_string()]).await?;
            return Ok(NavigationOutcome::Reloaded {
                namespace,
                reason: "recovered from aborted state".to_string(),
            });
        }

        let from = self.current.as_ref().map(|c| c.namespace.clone());
        if from.as_deref() == Some(to) {
            return Ok(NavigationOutcome::Unchanged {
                namespace: to.to_string(),
            });
        }

        let selection = self.table.select(from.as_deref(), to);
        self.transition(from, to, selection.def).await
    }

    /// Route an activated anchor
    pub async fn follow_link(&mut self, href: &str) -> Result<NavigationOutcome> {
        match self.links.resolve(href)? {
            LinkTarget::View { namespace, .. } => self.navigate_to(&namespace).await,
            LinkTarget::Passthrough(href) => Ok(NavigationOutcome::Passthrough { href }),
        }
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.binding.scroll_by(delta);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.binding.resize(viewport, self.surface.as_ref());
    }

    /// Advance the bound engine and its triggers by one frame
    pub fn frame(&mut self, dt: Duration) -> FrameReport {
        self.binding.frame(dt, self.surface.as_ref())
    }

    async fn transition(
        &mut self,
        from: Option<String>,
        to: &str,
        def: TransitionDef,
    ) -> Result<NavigationOutcome> {
        let mut record = TransitionRecord::new(from.clone(), to, &def.name);
        info!(record = %record.id, from = ?from, to, transition = %def.name, "Transition selected");
        self.events.send(LifecycleEvent::TransitionSelected {
            record: record.id,
            from,
            to: to.to_string(),
            transition: def.name.clone(),
        });

        let started = Instant::now();
        let mut choreography = Duration::ZERO;
        match self.run_phases(&mut record, &def, &mut choreography).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                info!(record = %record.id, to, elapsed_ms = elapsed.as_millis() as u64, "Transition complete");
                self.events.send(LifecycleEvent::TransitionCompleted {
                    record: record.id,
                    to: to.to_string(),
                    elapsed_ms: elapsed.as_millis() as u64,
                });
                Ok(NavigationOutcome::Completed(TransitionReport {
                    record: record.id,
                    from: record.from.clone(),
                    to: record.to.clone(),
                    transition: record.transition.clone(),
                    phases: record.visited().to_vec(),
                    choreography,
                    elapsed,
                }))
            }
            Err(err) => self.abort(record, err).await,
        }
    }

    async fn run_phases(
        &mut self,
        record: &mut TransitionRecord,
        def: &TransitionDef,
        choreography: &mut Duration,
    ) -> Result<()> {
        let outgoing = self.current.as_ref().map(|c| c.id);

        self.enter_phase(record, Phase::Leaving)?;
        self.binding.disable();
        let cast = Cast {
            outgoing,
            incoming: None,
        };
        *choreography += self.play(record, Timeline::leave(def), cast).await;

        self.enter_phase(record, Phase::Swapping)?;
        let fetched = self.source.fetch(&record.to).await;
        self.pump_inbox();
        let incoming = fetched?;
        self.surface.attach(&incoming);
        if let Some(old) = outgoing {
            match def.swap {
                SwapMode::Detach => self.surface.remove(old),
                SwapMode::Hide => self.surface.hide(old),
            }
        }
        debug!(outgoing = ?outgoing, incoming = %incoming.id, "Containers swapped");
        self.events.send(LifecycleEvent::DomSwapped {
            outgoing,
            incoming: incoming.id,
        });

        self.enter_phase(record, Phase::BeforeEnter)?;
        self.rebind(&incoming)?;

        self.enter_phase(record, Phase::Entering)?;
        self.surface.reset_native_scroll();
        self.events.send(LifecycleEvent::NativeScrollReset);
        let cast = Cast {
            outgoing,
            incoming: Some(incoming.id),
        };
        *choreography += self.play(record, Timeline::enter(def), cast).await;

        if let Some(old) = outgoing {
            self.surface.remove(old);
            self.events
                .send(LifecycleEvent::ContainerReleased { container: old });
        }
        self.current = Some(incoming);
        self.enter_phase(record, Phase::Idle)?;
        Ok(())
    }

    fn enter_phase(&mut self, record: &mut TransitionRecord, phase: Phase) -> Result<()> {
        record.advance(phase)?;
        self.phase = phase;
        debug!(record = %record.id, phase = %phase, "Phase entered");
        self.events.send(LifecycleEvent::PhaseEntered {
            record: record.id,
            phase,
        });
        self.pump_inbox();
        Ok(())
    }

    /// Replace the binding with one scoped to `container`
    fn rebind(&mut self, container: &Container) -> Result<()> {
        self.binding.destroy();
        self.binding.create(container)?;
        self.binding.register_all(container)?;
        self.run_hooks(container)?;
        self.binding.refresh(self.surface.as_ref());
        Ok(())
    }

    fn run_hooks(&mut self, container: &Container) -> Result<()> {
        let Some(hooks) = self.hooks.get_mut(&container.namespace) else {
            return Ok(());
        };
        for hook in hooks.iter_mut() {
            let mut ctx = ViewContext::new(container, &mut self.binding);
            if let Err(err) = hook(&mut ctx) {
                if !err.is_recoverable() {
                    return Err(err);
                }
                warn!(namespace = %container.namespace, "View hook: {}", err);
            }
        }
        Ok(())
    }

    /// Play `timeline` on the shared frame tick. Returns the declared length.
    async fn play(&mut self, record: &TransitionRecord, timeline: Timeline, cast: Cast) -> Duration {
        let timeline = if self.config.general.reduced_motion {
            timeline.reduced()
        } else {
            timeline
        };
        let total = timeline.duration();
        debug!(record = %record.id, stage = ?timeline.stage, total_ms = total.as_millis() as u64, "Choreography started");
        self.events.send(LifecycleEvent::ChoreographyStarted {
            record: record.id,
            stage: timeline.stage,
            duration_ms: total.as_millis() as u64,
        });

        timeline.apply(Duration::ZERO, &mut self.overlay, self.surface.as_mut(), cast);
        if !total.is_zero() {
            let mut ticker = tokio::time::interval(self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            let mut elapsed = Duration::ZERO;
            while elapsed < total {
                ticker.tick().await;
                elapsed = (elapsed + self.tick).min(total);
                timeline.apply(elapsed, &mut self.overlay, self.surface.as_mut(), cast);
                self.binding.frame(self.tick, self.surface.as_ref());
                self.pump_inbox();
            }
        }

        self.events.send(LifecycleEvent::ChoreographyFinished {
            record: record.id,
            stage: timeline.stage,
        });
        total
    }

    async fn abort(&mut self, mut record: TransitionRecord, err: Error) -> Result<NavigationOutcome> {
        error!(record = %record.id, phase = %record.phase(), "Transition aborted: {}", err);
        record.abort();
        self.phase = Phase::Aborted;
        self.events.send(LifecycleEvent::Aborted {
            record: record.id,
            reason: err.to_string(),
        });

        let mut candidates = vec![record.to.clone()];
        candidates.extend(record.from.clone());
        match self.reload(&candidates).await {
            Ok(namespace) => Ok(NavigationOutcome::Reloaded {
                namespace,
                reason: err.to_string(),
            }),
            Err(reload_err) => {
                error!("Reload failed, staying aborted: {}", reload_err);
                Err(err)
            }
        }
    }

    /// Rebuild the page without animation, as a full reload would. Tries
    /// each candidate view in turn; a candidate that fails to bind is torn
    /// down again before the next one is tried.
    async fn reload(&mut self, candidates: &[String]) -> Result<String> {
        self.binding.destroy();
        self.overlay.reset();
        self.surface.clear();
        self.current = None;

        let mut last_err = None;
        for namespace in candidates {
            let fetched = self.source.fetch(namespace).await;
            // Still not idle: whatever arrived during the fetch is held or refused
            self.pump_inbox();
            let container = match fetched {
                Ok(container) => container,
                Err(err) => {
                    warn!(namespace = %namespace, "Reload fetch failed: {}", err);
                    last_err = Some(err);
                    continue;
                }
            };

            self.surface.attach(&container);
            if let Err(err) = self.rebind(&container) {
                warn!(namespace = %namespace, "Reload could not bind view: {}", err);
                self.binding.destroy();
                self.surface.clear();
                last_err = Some(err);
                continue;
            }
            self.surface.reset_native_scroll();
            self.events.send(LifecycleEvent::NativeScrollReset);

            let namespace = container.namespace.clone();
            self.current = Some(container);
            self.phase = Phase::Idle;
            info!(namespace = %namespace, "Page reloaded");
            self.events.send(LifecycleEvent::Reloaded {
                namespace: namespace.clone(),
            });
            return Ok(namespace);
        }

        Err(last_err.unwrap_or_else(|| Error::Other("no view to reload".to_string())))
    }

    /// Apply the busy policy to everything that arrived mid-transition
    fn pump_inbox(&mut self) {
        let mut commands = Vec::new();
        if let Some(inbox) = self.inbox.as_mut() {
            while let Ok(command) = inbox.try_recv() {
                commands.push(command);
            }
        }
        for command in commands {
            match command {
                Command::Navigate(request) => self.hold(request),
                Command::Follow { href, respond } => match self.links.resolve(&href) {
                    Ok(LinkTarget::View { namespace, .. }) => self.hold(NavigationRequest {
                        to: namespace,
                        respond,
                    }),
                    Ok(LinkTarget::Passthrough(href)) => {
                        reply(respond, Ok(NavigationOutcome::Passthrough { href }))
                    }
                    Err(err) => reply(respond, Err(err)),
                },
                Command::Scroll { delta } => self.scroll_by(delta),
                Command::Resize(viewport) => self.resize(viewport),
            }
        }
    }

    fn hold(&mut self, request: NavigationRequest) {
        if self.config.navigation.busy_policy == BusyPolicy::Queue && self.pending.is_none() {
            info!(to = %request.to, "Navigation queued behind active transition");
            self.events.send(LifecycleEvent::NavigationQueued {
                to: request.to.clone(),
            });
            self.pending = Some(request);
            return;
        }

        warn!(to = %request.to, policy = ?self.config.navigation.busy_policy, "Navigation rejected, transition in progress");
        self.events.send(LifecycleEvent::NavigationRejected {
            to: request.to.clone(),
        });
        reply(request.respond, Err(Error::NavigationWhileBusy(request.to)));
    }

    async fn serve(&mut self, request: NavigationRequest) {
        let result = self.navigate_to(&request.to).await;
        if let Err(err) = &result {
            warn!(to = %request.to, "Navigation failed: {}", err);
        }
        reply(request.respond, result);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Navigate(request) => self.serve(request).await,
            Command::Follow { href, respond } => match self.links.resolve(&href) {
                Ok(LinkTarget::View { namespace, .. }) => {
                    self.serve(NavigationRequest {
                        to: namespace,
                        respond,
                    })
                    .await
                }
                Ok(LinkTarget::Passthrough(href)) => {
                    reply(respond, Ok(NavigationOutcome::Passthrough { href }))
                }
                Err(err) => reply(respond, Err(err)),
            },
            Command::Scroll { delta } => self.scroll_by(delta),
            Command::Resize(viewport) => self.resize(viewport),
        }
    }

    /// Serve commands and tick frames until shutdown or until every
    /// [`super::Navigator`] is dropped
    pub async fn run(
        &mut self,
        inbox: mpsc::UnboundedReceiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        self.inbox = Some(inbox);
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick_ms = self.tick.as_millis() as u64, "Orchestrator started");

        loop {
            if let Some(request) = self.pending.take() {
                self.serve(request).await;
                continue;
            }

            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Orchestrator received shutdown signal");
                        break;
                    }
                }

                command = next_command(&mut self.inbox) => {
                    match command {
                        Some(command) => self.handle(command).await,
                        None => {
                            debug!("All navigators dropped");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    self.frame(self.tick);
                }
            }
        }

        self.inbox = None;
        if let Some(request) = self.pending.take() {
            reply(
                request.respond,
                Err(Error::Other("orchestrator shut down".to_string())),
            );
        }
    }
}

async fn next_command(inbox: &mut Option<mpsc::UnboundedReceiver<Command>>) -> Option<Command> {
    match inbox {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn reply(respond: Option<Responder>, result: Result<NavigationOutcome>) {
    if let Some(tx) = respond {
        // The requester may have stopped waiting
        let _ = tx.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElementConfig, TransitionConfig, TriggerConfig, ViewConfig};
    use crate::orchestrator::Navigator;
    use crate::page::{ConfigContainerSource, MemorySurface};
    use crate::transition::{MemoryOverlay, Stage, WipeShape};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        orch: Orchestrator,
        surface: MemorySurface,
        overlay: MemoryOverlay,
        events: mpsc::UnboundedReceiver<LifecycleEvent>,
    }

    impl Harness {
        fn new(config: AppConfig) -> Self {
            let source = ConfigContainerSource::from_config(&config);
            Self::with_source(config, Box::new(source))
        }

        fn with_source(config: AppConfig, source: Box<dyn ContainerSource>) -> Self {
            let surface = MemorySurface::new();
            let overlay = MemoryOverlay::new();
            let (tx, events) = mpsc::unbounded_channel();
            let orch = Orchestrator::new(
                config,
                source,
                Box::new(surface.clone()),
                Box::new(overlay.clone()),
            )
            .unwrap()
            .with_events(tx);
            Self {
                orch,
                surface,
                overlay,
                events,
            }
        }

        fn drain(&mut self) -> Vec<LifecycleEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    fn reduced() -> AppConfig {
        let mut config = AppConfig::default();
        config.general.reduced_motion = true;
        config
    }

    fn report(outcome: NavigationOutcome) -> TransitionReport {
        match outcome {
            NavigationOutcome::Completed(report) => report,
            other => panic!("expected a completed transition, got {other:?}"),
        }
    }

    fn position(events: &[LifecycleEvent], pred: impl Fn(&LifecycleEvent) -> bool) -> usize {
        events.iter().position(pred).expect("event not found")
    }

    const FULL_CYCLE: [Phase; 6] = [
        Phase::Idle,
        Phase::Leaving,
        Phase::Swapping,
        Phase::BeforeEnter,
        Phase::Entering,
        Phase::Idle,
    ];

    #[tokio::test]
    async fn test_boot_binds_first_view() {
        let mut h = Harness::new(reduced());
        let report = report(h.orch.boot("home").await.unwrap());

        assert_eq!(report.transition, crate::transition::IDENTITY);
        assert_eq!(report.from, None);
        assert_eq!(report.phases, FULL_CYCLE);
        assert_eq!(h.orch.current_namespace(), Some("home"));
        assert_eq!(h.surface.visible_namespaces(), ["home"]);
        assert_eq!(h.orch.binding().stats().live, 1);
        assert_eq!(h.orch.binding().triggers().len(), 5);
        assert!(h.orch.boot("about").await.is_err());
    }

    #[tokio::test]
    async fn test_at_most_one_live_binding() {
        let mut h = Harness::new(reduced());
        h.orch.boot("home").await.unwrap();

        for to in ["about", "home", "about", "home", "about", "home"] {
            h.orch.navigate_to(to).await.unwrap();
            let stats = h.orch.binding().stats();
            assert_eq!(stats.live, 1);
            assert_eq!(stats.peak_live, 1);
            assert_eq!(h.surface.mounted().len(), 1);
            assert_eq!(
                h.orch.binding().bound_container(),
                h.orch.current_container().map(|c| c.id)
            );
        }
        assert_eq!(h.orch.binding().stats().created, 7);
        assert_eq!(h.orch.binding().stats().destroyed, 6);
    }

    #[tokio::test]
    async fn test_kill_all_once_before_register_all() {
        let mut h = Harness::new(reduced());
        h.orch.boot("home").await.unwrap();
        let outgoing = h.orch.current_container().unwrap().id;
        h.drain();

        h.orch.navigate_to("about").await.unwrap();
        let incoming = h.orch.current_container().unwrap().id;
        let events = h.drain();

        let kills: Vec<_> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, LifecycleEvent::TriggersKilled { .. }))
            .collect();
        assert_eq!(kills.len(), 1);
        assert_eq!(
            *kills[0].1,
            LifecycleEvent::TriggersKilled {
                container: outgoing,
                count: 5
            }
        );

        let registered = position(&events, |e| {
            matches!(e, LifecycleEvent::TriggersRegistered { container, .. } if *container == incoming)
        });
        assert!(kills[0].0 < registered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_ordering() {
        let mut h = Harness::new(AppConfig::default());
        h.orch.boot("home").await.unwrap();
        h.drain();

        h.orch.navigate_to("about").await.unwrap();
        let events = h.drain();

        let disabled = position(&events, |e| matches!(e, LifecycleEvent::EngineDisabled { .. }));
        let swapped = position(&events, |e| matches!(e, LifecycleEvent::DomSwapped { .. }));
        let created = position(&events, |e| matches!(e, LifecycleEvent::BindingCreated { .. }));
        let entry = position(&events, |e| {
            matches!(e, LifecycleEvent::ChoreographyStarted { stage: Stage::Enter, .. })
        });
        assert!(disabled < swapped);
        assert!(swapped < created);
        assert!(created < entry);

        let reset = position(&events, |e| matches!(e, LifecycleEvent::NativeScrollReset));
        assert!(reset < entry);
    }

    #[tokio::test]
    async fn test_transition_selection() {
        let mut config = reduced();
        config.views.push(ViewConfig {
            namespace: "contact".to_string(),
            path: "/contact".to_string(),
            height: 1200.0,
            elements: Vec::new(),
        });
        config.transitions = vec![
            TransitionConfig::named("A")
                .from_namespaces(["home"])
                .to_namespaces(["about"]),
            TransitionConfig::named("default"),
        ];
        config.default_transition = Some("default".to_string());

        let mut h = Harness::new(config);
        h.orch.boot("home").await.unwrap();
        assert_eq!(report(h.orch.navigate_to("about").await.unwrap()).transition, "A");
        assert_eq!(
            report(h.orch.navigate_to("contact").await.unwrap()).transition,
            "default"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reduced_motion_visits_every_phase_instantly() {
        let mut h = Harness::new(reduced());
        h.orch.boot("home").await.unwrap();

        let report = report(h.orch.navigate_to("about").await.unwrap());
        assert_eq!(report.transition, "from-home");
        assert_eq!(report.phases, FULL_CYCLE);
        assert_eq!(report.choreography, Duration::ZERO);
        assert_eq!(report.elapsed, Duration::ZERO);
        assert!(h.orch.overlay().shape().is_invisible());
        assert_eq!(h.surface.visible_namespaces(), ["about"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wipe_plays_declared_durations() {
        let mut h = Harness::new(AppConfig::default());
        h.orch.boot("home").await.unwrap();

        let report = report(h.orch.navigate_to("about").await.unwrap());
        assert_eq!(report.choreography, Duration::from_millis(2700));
        assert!(report.elapsed >= report.choreography);

        // Covered at the end of the leave stage, uncovered at the end
        let writes = h.overlay.writes();
        assert!(writes.contains(&WipeShape::TOP_FULL.to_path()));
        assert_eq!(h.overlay.last(), Some(WipeShape::BOTTOM_FLAT.to_path()));

        let about = h.orch.current_container().unwrap().id;
        assert!((h.surface.opacity(about).unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(h.surface.mounted().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_policy_runs_second_request_after_first() {
        let mut h = Harness::new(AppConfig::default());
        h.orch.boot("home").await.unwrap();

        let (navigator, inbox) = Navigator::channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let driver = async {
            let first = navigator.request("about").unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            let second = navigator.request("home").unwrap();
            let third = navigator.request("about").unwrap();
            let outcomes = (
                first.outcome().await,
                second.outcome().await,
                third.outcome().await,
            );
            shutdown_tx.send(true).unwrap();
            outcomes
        };
        let (_, (first, second, third)) = tokio::join!(h.orch.run(inbox, shutdown_rx), driver);

        assert_eq!(first.unwrap().namespace(), Some("about"));
        assert_eq!(second.unwrap().namespace(), Some("home"));
        assert!(matches!(third, Err(Error::NavigationWhileBusy(to)) if to == "about"));
        assert_eq!(h.orch.current_namespace(), Some("home"));

        let events = h.drain();
        assert!(events.contains(&LifecycleEvent::NavigationQueued {
            to: "home".to_string()
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_policy_leaves_state_untouched() {
        let mut config = AppConfig::default();
        config.navigation.busy_policy = BusyPolicy::Reject;
        let mut h = Harness::new(config);
        h.orch.boot("home").await.unwrap();

        let (navigator, inbox) = Navigator::channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let driver = async {
            let first = navigator.request("about").unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            let second = navigator.navigate("home").await;
            let first = first.outcome().await;
            shutdown_tx.send(true).unwrap();
            (first, second)
        };
        let (_, (first, second)) = tokio::join!(h.orch.run(inbox, shutdown_rx), driver);

        assert!(matches!(second, Err(Error::NavigationWhileBusy(_))));
        assert_eq!(first.unwrap().namespace(), Some("about"));
        assert_eq!(h.orch.current_namespace(), Some("about"));
        assert_eq!(h.orch.phase(), Phase::Idle);
    }

    /// Fails the next `n` fetches of a namespace
    struct Flaky {
        inner: ConfigContainerSource,
        failing: Rc<RefCell<HashMap<String, u32>>>,
        delay: Duration,
    }

    #[async_trait::async_trait(?Send)]
    impl ContainerSource for Flaky {
        async fn fetch(&self, namespace: &str) -> Result<Container> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            {
                let mut failing = self.failing.borrow_mut();
                if let Some(left) = failing.get_mut(namespace) {
                    if *left > 0 {
                        *left -= 1;
                        return Err(Error::Other(format!("fetch of {} failed", namespace)));
                    }
                }
            }
            self.inner.fetch(namespace).await
        }

        fn has_view(&self, namespace: &str) -> bool {
            self.inner.has_view(namespace)
        }
    }

    fn flaky() -> (Harness, Rc<RefCell<HashMap<String, u32>>>) {
        slow(reduced(), Duration::ZERO)
    }

    fn slow(config: AppConfig, delay: Duration) -> (Harness, Rc<RefCell<HashMap<String, u32>>>) {
        let failing = Rc::new(RefCell::new(HashMap::new()));
        let source = Flaky {
            inner: ConfigContainerSource::from_config(&config),
            failing: failing.clone(),
            delay,
        };
        (Harness::with_source(config, Box::new(source)), failing)
    }

    /// Requests `about`, then `home` and `about` again while the reload
    /// after the failed first fetch is still fetching
    async fn navigate_during_reload(
        h: &mut Harness,
    ) -> (
        Result<NavigationOutcome>,
        Result<NavigationOutcome>,
        Result<NavigationOutcome>,
    ) {
        let (navigator, inbox) = Navigator::channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let driver = async {
            let first = navigator.request("about").unwrap();
            // The failed fetch ends at 500ms, the reload fetch at 1000ms
            tokio::time::sleep(Duration::from_millis(700)).await;
            let second = navigator.request("home").unwrap();
            let third = navigator.request("about").unwrap();
            let outcomes = (
                first.outcome().await,
                second.outcome().await,
                third.outcome().await,
            );
            shutdown_tx.send(true).unwrap();
            outcomes
        };
        let (_, outcomes) = tokio::join!(h.orch.run(inbox, shutdown_rx), driver);
        outcomes
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_policy_holds_during_reload() {
        let mut config = reduced();
        config.navigation.busy_policy = BusyPolicy::Reject;
        let (mut h, failing) = slow(config, Duration::from_millis(500));
        h.orch.boot("home").await.unwrap();
        failing.borrow_mut().insert("about".to_string(), 1);

        let (first, second, third) = navigate_during_reload(&mut h).await;
        assert!(matches!(
            first.unwrap(),
            NavigationOutcome::Reloaded { namespace, .. } if namespace == "about"
        ));
        assert!(matches!(second, Err(Error::NavigationWhileBusy(to)) if to == "home"));
        assert!(matches!(third, Err(Error::NavigationWhileBusy(to)) if to == "about"));
        assert_eq!(h.orch.current_namespace(), Some("about"));
        assert_eq!(h.orch.phase(), Phase::Idle);
        assert_eq!(h.orch.binding().stats().live, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_policy_holds_during_reload() {
        let (mut h, failing) = slow(reduced(), Duration::from_millis(500));
        h.orch.boot("home").await.unwrap();
        failing.borrow_mut().insert("about".to_string(), 1);

        let (first, second, third) = navigate_during_reload(&mut h).await;
        assert!(matches!(
            first.unwrap(),
            NavigationOutcome::Reloaded { namespace, .. } if namespace == "about"
        ));
        assert_eq!(second.unwrap().namespace(), Some("home"));
        assert!(matches!(third, Err(Error::NavigationWhileBusy(to)) if to == "about"));
        assert_eq!(h.orch.current_namespace(), Some("home"));
        assert_eq!(h.orch.binding().stats().peak_live, 1);

        let events = h.drain();
        assert!(events.contains(&LifecycleEvent::NavigationQueued {
            to: "home".to_string()
        }));
    }

    #[tokio::test]
    async fn test_abort_reloads_destination() {
        let (mut h, failing) = flaky();
        h.orch.boot("home").await.unwrap();
        failing.borrow_mut().insert("about".to_string(), 1);

        let outcome = h.orch.navigate_to("about").await.unwrap();
        assert!(matches!(&outcome, NavigationOutcome::Reloaded { namespace, .. } if namespace == "about"));
        assert_eq!(h.orch.phase(), Phase::Idle);
        assert!(h.orch.overlay().shape().is_invisible());
        assert_eq!(h.surface.visible_namespaces(), ["about"]);

        let proxy = h.orch.binding().proxy().unwrap();
        assert!(proxy.handle().is_enabled());
        assert_eq!(h.orch.binding().stats().live, 1);
        assert!(h
            .drain()
            .iter()
            .any(|e| matches!(e, LifecycleEvent::Aborted { .. })));
    }

    #[tokio::test]
    async fn test_abort_falls_back_to_source_view() {
        let (mut h, failing) = flaky();
        h.orch.boot("home").await.unwrap();
        failing.borrow_mut().insert("about".to_string(), u32::MAX);

        let outcome = h.orch.navigate_to("about").await.unwrap();
        assert_eq!(outcome.namespace(), Some("home"));
        assert_eq!(h.orch.current_namespace(), Some("home"));
    }

    #[tokio::test]
    async fn test_failed_reload_stays_aborted_until_next_navigation() {
        let (mut h, failing) = flaky();
        h.orch.boot("home").await.unwrap();
        failing.borrow_mut().insert("about".to_string(), u32::MAX);
        failing.borrow_mut().insert("home".to_string(), u32::MAX);

        assert!(h.orch.navigate_to("about").await.is_err());
        assert_eq!(h.orch.phase(), Phase::Aborted);
        assert_eq!(h.orch.binding().stats().live, 0);
        assert!(h.surface.mounted().is_empty());

        failing.borrow_mut().clear();
        let outcome = h.orch.navigate_to("about").await.unwrap();
        assert_eq!(outcome.namespace(), Some("about"));
        assert_eq!(h.orch.phase(), Phase::Idle);
    }

    fn failing_hook() -> ViewHook {
        Box::new(|_: &mut ViewContext<'_>| -> Result<()> {
            Err(Error::Other("view script crashed".to_string()))
        })
    }

    #[tokio::test]
    async fn test_reload_skips_view_that_fails_to_bind() {
        let mut h = Harness::new(reduced());
        h.orch.on_view_enter("about", failing_hook());
        h.orch.boot("home").await.unwrap();

        let outcome = h.orch.navigate_to("about").await.unwrap();
        assert!(matches!(&outcome, NavigationOutcome::Reloaded { namespace, .. } if namespace == "home"));
        assert_eq!(h.orch.phase(), Phase::Idle);
        assert_eq!(h.orch.binding().stats().live, 1);
        assert_eq!(h.surface.visible_namespaces(), ["home"]);
        assert_eq!(
            h.orch.binding().bound_container(),
            h.orch.current_container().map(|c| c.id)
        );
    }

    #[tokio::test]
    async fn test_failed_rebind_leaves_nothing_bound() {
        let mut h = Harness::new(reduced());
        h.orch.boot("home").await.unwrap();
        h.orch.on_view_enter("about", failing_hook());
        h.orch.on_view_enter("home", failing_hook());

        assert!(h.orch.navigate_to("about").await.is_err());
        assert_eq!(h.orch.phase(), Phase::Aborted);
        assert_eq!(h.orch.binding().stats().live, 0);
        assert_eq!(h.orch.binding().bound_container(), None);
        assert!(h.surface.mounted().is_empty());
        assert_eq!(h.orch.current_namespace(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eased_backend_through_navigation() {
        let mut config = reduced();
        config.scroll.backend = crate::config::ScrollBackendKind::Eased;
        let mut h = Harness::new(config);
        h.orch.boot("home").await.unwrap();

        let report = report(h.orch.navigate_to("about").await.unwrap());
        assert_eq!(report.phases, FULL_CYCLE);
        assert_eq!(h.orch.binding().stats().live, 1);

        h.orch.scroll_by(400.0);
        for _ in 0..30 {
            h.orch.frame(Duration::from_millis(16));
        }
        assert!((h.orch.binding().position().unwrap() - 400.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unknown_and_same_view() {
        let mut h = Harness::new(reduced());
        h.orch.boot("home").await.unwrap();

        assert!(matches!(
            h.orch.navigate_to("contact").await,
            Err(Error::UnknownView(_))
        ));
        assert_eq!(
            h.orch.navigate_to("home").await.unwrap(),
            NavigationOutcome::Unchanged {
                namespace: "home".to_string()
            }
        );
        assert_eq!(h.orch.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_follow_link() {
        let mut h = Harness::new(reduced());
        h.orch.boot("home").await.unwrap();

        let outcome = h.orch.follow_link("/about").await.unwrap();
        assert_eq!(outcome.namespace(), Some("about"));
        assert!(matches!(
            h.orch.follow_link("https://example.com/").await.unwrap(),
            NavigationOutcome::Passthrough { .. }
        ));
        assert!(matches!(
            h.orch.follow_link("#top").await.unwrap(),
            NavigationOutcome::Passthrough { .. }
        ));
    }

    #[tokio::test]
    async fn test_view_hook_registers_on_incoming_only() {
        let mut h = Harness::new(reduced());
        let stray = crate::page::ContainerId::new(999);
        h.orch.on_view_enter(
            "about",
            Box::new(move |ctx: &mut ViewContext<'_>| {
                let spec = ctx.trigger("about-copy", "center center")?;
                ctx.register(spec)?;
                let mut foreign = ctx.trigger("about-copy", "top bottom")?;
                foreign.container = stray;
                ctx.register(foreign)?;
                Ok(())
            }),
        );
        h.orch.boot("home").await.unwrap();

        let report = report(h.orch.navigate_to("about").await.unwrap());
        assert_eq!(report.to, "about");
        // The declared trigger plus the hook's own; the foreign one was refused
        assert_eq!(h.orch.binding().triggers().len(), 2);
    }

    #[tokio::test]
    async fn test_user_scroll_after_navigation() {
        let mut config = reduced();
        config.views[1].elements.push(ElementConfig {
            id: "footer".to_string(),
            top: 1500.0,
            height: 300.0,
            trigger: Some(TriggerConfig {
                start: "top bottom".to_string(),
                end: None,
                pin: false,
            }),
        });
        let mut h = Harness::new(config);
        h.orch.boot("home").await.unwrap();
        h.orch.navigate_to("about").await.unwrap();

        h.orch.scroll_by(700.0);
        let mut fired = 0;
        for _ in 0..240 {
            fired += h.orch.frame(Duration::from_millis(16)).fired;
        }
        // footer starts at 1500 - 900 = 600
        assert_eq!(fired, 1);
        assert!((h.orch.binding().position().unwrap() - 700.0).abs() < 1.0);
    }
}
