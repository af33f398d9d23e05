mod config;
mod script;

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{bail, Result};
use clap::Parser;
use device_integration::{SimulatedOrientationSource, SimulatedViewport};
use match_media::{
    install_with_current_runtime, listener, InstallOutcome, MediaEnvironment, QueryWatcher,
};
use shared::domain::Orientation;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{config::load_settings, script::DeviceEvent};

/// Replays device events against a media query and prints how its match
/// state evolves.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to `simulator.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    orientation: Option<Orientation>,
    /// `rotate:<portrait|landscape>` or `resize:<width>x<height>`, in order.
    #[arg(long = "event")]
    events: Vec<DeviceEvent>,
    /// Print one JSON snapshot per line instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(query) = args.query {
        settings.query = query;
    }
    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(height) = args.height {
        settings.height = height;
    }
    if let Some(orientation) = args.orientation {
        settings.orientation = orientation;
    }

    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let orientation = SimulatedOrientationSource::new(settings.orientation);
    let viewport = SimulatedViewport::new(settings.width, settings.height);
    let environment = MediaEnvironment::new(orientation.clone(), viewport.clone());
    if install_with_current_runtime(environment)? == InstallOutcome::Skipped {
        bail!("match_media could not be installed without an async runtime");
    }

    let watcher = match_media::match_media(settings.query.clone())?;
    settle().await;
    if let Err(err) = watcher.evaluate() {
        warn!(query = %settings.query, error = %err, "query will never match");
    }

    let json = args.json;
    report(&watcher, "initial", json)?;

    let previous = Arc::new(AtomicBool::new(watcher.matches()));
    let on_change = listener(move |watcher: &QueryWatcher| {
        let matches = watcher.matches();
        let label = if previous.swap(matches, Ordering::SeqCst) != matches {
            "flipped"
        } else {
            "notified"
        };
        if let Err(err) = report(watcher, label, json) {
            warn!(error = %err, "failed to report watcher state");
        }
    });
    watcher.add_listener(on_change.clone());

    for event in &args.events {
        info!(%event, "applying device event");
        event.apply(&orientation, &viewport);
    }

    watcher.remove_listener(&on_change);
    watcher.unmount();
    Ok(())
}

/// Lets the initial orientation probe resolve before the first report.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn report(watcher: &QueryWatcher, label: &str, json: bool) -> Result<()> {
    let snapshot = watcher.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!(
            "{label:<8} orientation={} size={}x{} matches={}",
            snapshot.orientation, snapshot.width, snapshot.height, snapshot.matches
        );
    }
    Ok(())
}
