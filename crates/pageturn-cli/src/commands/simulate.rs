use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, watch};
use tracing::warn;

use pageturn_core::orchestrator::{NavigationOutcome, Navigator, Orchestrator};
use pageturn_core::page::{ConfigContainerSource, LinkResolver, LinkTarget, MemorySurface};
use pageturn_core::transition::MemoryOverlay;
use pageturn_core::trigger::{ThresholdTriggers, TriggerEvent, TriggerSet};
use pageturn_core::{AppConfig, LifecycleEvent};

/// How long scroll input is given to come to rest
const SETTLE: Duration = Duration::from_millis(1200);

pub struct Options {
    pub reduced_motion: bool,
    pub scroll: Option<f64>,
    pub json: bool,
}

struct Feeds {
    lifecycle: mpsc::UnboundedReceiver<LifecycleEvent>,
    triggers: mpsc::UnboundedReceiver<TriggerEvent>,
}

impl Feeds {
    fn print(&mut self, json: bool) -> Result<()> {
        while let Ok(event) = self.lifecycle.try_recv() {
            if json {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        while let Ok(event) = self.triggers.try_recv() {
            if json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                println!(
                    "    {} {:?} at {:.0}px",
                    event.element, event.crossing, event.position
                );
            }
        }
        Ok(())
    }
}

fn is_href(step: &str) -> bool {
    step.starts_with('/') || step.starts_with('#') || step.contains("://")
}

pub async fn run(mut config: AppConfig, route: &[String], options: Options) -> Result<()> {
    if options.reduced_motion {
        config.general.reduced_motion = true;
    }
    let (first, rest) = route
        .split_first()
        .ok_or_else(|| anyhow!("Nothing to simulate: the route is empty"))?;

    // The first step is booted, so it has to name a view
    let first = if is_href(first) {
        match LinkResolver::from_config(&config)?.resolve(first)? {
            LinkTarget::View { namespace, .. } => namespace,
            LinkTarget::Passthrough(href) => {
                return Err(anyhow!("{} does not resolve to a view", href));
            }
        }
    } else {
        first.clone()
    };

    let surface = MemorySurface::new();
    let overlay = MemoryOverlay::new();
    let (lifecycle_tx, lifecycle) = mpsc::unbounded_channel();
    let (trigger_tx, triggers) = mpsc::unbounded_channel();
    let mut feeds = Feeds {
        lifecycle,
        triggers,
    };

    let source = ConfigContainerSource::from_config(&config);
    let mut orchestrator = Orchestrator::new(
        config,
        Box::new(source),
        Box::new(surface.clone()),
        Box::new(overlay.clone()),
    )?
    .with_events(lifecycle_tx)
    .with_triggers(
        TriggerSet::new(Box::new(ThresholdTriggers::new())).with_event_sender(trigger_tx),
    );

    let outcome = orchestrator.boot(&first).await?;
    print_outcome(&outcome, options.json)?;
    feeds.print(options.json)?;

    let (navigator, inbox) = Navigator::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver = async {
        let result = drive(&navigator, rest, &options, &mut feeds).await;
        let _ = shutdown_tx.send(true);
        result
    };
    let (_, result) = tokio::join!(orchestrator.run(inbox, shutdown_rx), driver);
    result?;
    feeds.print(options.json)?;

    if !options.json {
        let stats = orchestrator.binding().stats();
        println!();
        println!(
            "Bound to: {}",
            orchestrator.current_namespace().unwrap_or("(nothing)")
        );
        println!("Visible: {}", surface.visible_namespaces().join(", "));
        println!(
            "Bindings: {} created, {} destroyed, peak live {}",
            stats.created, stats.destroyed, stats.peak_live
        );
        println!("Overlay writes: {}", overlay.writes().len());
    }

    Ok(())
}

async fn drive(
    navigator: &Navigator,
    steps: &[String],
    options: &Options,
    feeds: &mut Feeds,
) -> Result<()> {
    scroll(navigator, options, feeds).await?;

    for step in steps {
        let pending = if is_href(step) {
            navigator.follow(step.clone())?
        } else {
            navigator.request(step.clone())?
        };

        match pending.outcome().await {
            Ok(outcome) => print_outcome(&outcome, options.json)?,
            Err(e) => {
                warn!("Navigation to {} failed: {}", step, e);
                if !options.json {
                    println!("{}: {}", step, e);
                }
            }
        }
        feeds.print(options.json)?;
        scroll(navigator, options, feeds).await?;
    }

    Ok(())
}

async fn scroll(navigator: &Navigator, options: &Options, feeds: &mut Feeds) -> Result<()> {
    let Some(distance) = options.scroll else {
        return Ok(());
    };
    navigator.scroll_by(distance)?;
    tokio::time::sleep(SETTLE).await;
    feeds.print(options.json)
}

fn print_outcome(outcome: &NavigationOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    match outcome {
        NavigationOutcome::Completed(report) => {
            let phases: Vec<String> = report.phases.iter().map(|p| p.to_string()).collect();
            println!(
                "{} -> {} via {} in {}ms (choreography {}ms)",
                report.from.as_deref().unwrap_or("(boot)"),
                report.to,
                report.transition,
                report.elapsed.as_millis(),
                report.choreography.as_millis()
            );
            println!("    {}", phases.join(" > "));
        }
        NavigationOutcome::Unchanged { namespace } => {
            println!("Already on {}", namespace);
        }
        NavigationOutcome::Passthrough { href } => {
            println!("{} left to the browser", href);
        }
        NavigationOutcome::Reloaded { namespace, reason } => {
            println!("Reloaded {} after abort: {}", namespace, reason);
        }
    }
    Ok(())
}
