use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pageturn_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "pageturn")]
#[command(author, version, about = "Drive and inspect page transitions and scroll triggers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ~/.config/pageturn/config.toml
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate through views against in-memory backends
    Simulate {
        /// Namespaces or hrefs to visit; the first one is booted
        #[arg(required = true)]
        route: Vec<String>,
        /// Collapse choreography durations to zero
        #[arg(long)]
        reduced_motion: bool,
        /// Scroll distance applied after each navigation
        #[arg(short = 's', long)]
        scroll: Option<f64>,
        /// Print every lifecycle and trigger event as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print which transition runs for every pair of views
    Routes,
    /// Replay a pointer path through the cursor and hover feedback
    Pointer {
        /// Number of hoverable menu items
        #[arg(short = 'n', long, default_value_t = 3)]
        items: usize,
        /// Frames to simulate
        #[arg(short = 'f', long, default_value_t = 120)]
        frames: usize,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Simulate {
            route,
            reduced_motion,
            scroll,
            json,
        } => {
            let options = commands::simulate::Options {
                reduced_motion,
                scroll,
                json,
            };
            commands::simulate::run(config, &route, options).await
        }
        Commands::Routes => commands::routes::run(&config),
        Commands::Pointer { items, frames } => commands::pointer::run(&config, items, frames),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::init(force),
            ConfigAction::Path => commands::config::path(),
            ConfigAction::Show => commands::config::show(&config),
        },
    }
}
