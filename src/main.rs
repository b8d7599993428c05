use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use weather_store::config::{self, Config, SourceKind};
use weather_store::display;
use weather_store::input::{Refresher, SensorSource, SimulatedSource, SnapshotSource};
use weather_store::store::{SensorStore, Snapshot};

/// How long to wait for the refresh loop to notice the stop flag.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "weather-store")]
#[command(about = "Keeps the weather display's sensor store refreshed")]
struct Cli {
    /// Where refreshed data comes from (simulated or snapshot)
    #[arg(long)]
    source: Option<SourceKind>,

    /// Seconds between refreshes
    #[arg(long)]
    interval: Option<u64>,

    /// Snapshot file to restore from and save to
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Save the store to the snapshot file on exit
    #[arg(long)]
    save_on_exit: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load_config(cli: Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(source) = cli.source {
        config.refresh.source = source;
    }
    if let Some(interval) = cli.interval {
        config.refresh.interval_secs = interval;
    }
    if let Some(path) = cli.snapshot {
        config.snapshot.path = path;
    }
    if cli.save_on_exit {
        config.snapshot.save_on_exit = true;
    }
    config
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    config::load_dotenv();
    init_logger();

    let config = load_config(Cli::parse());
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    info!("Starting weather store");
    info!("  Source: {}", config.refresh.source);
    info!("  Refresh interval: {:?}", config.refresh.interval());
    info!("  Snapshot: {}", config.snapshot.path.display());

    let store = Arc::new(SensorStore::new());
    let display_task = display::spawn_display(store.clone());

    if config.snapshot.load_on_start {
        store.restore(Snapshot::load_or_default(&config.snapshot.path));
    }

    let source: Arc<dyn SensorSource> = match config.refresh.source {
        SourceKind::Simulated => Arc::new(SimulatedSource::new()),
        SourceKind::Snapshot => Arc::new(SnapshotSource::new(&config.snapshot.path)),
    };
    let refresh_task = Refresher::new(store.clone(), source, config.refresh.interval()).start();

    info!("Weather store is running, press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    store.set_stop_refreshing(true);
    let refresh_abort = refresh_task.abort_handle();
    if tokio::time::timeout(SHUTDOWN_GRACE, refresh_task).await.is_err() {
        warn!("Refresh loop did not stop in time, aborting");
        refresh_abort.abort();
    }

    if config.snapshot.save_on_exit
        && let Err(e) = store.snapshot().save(&config.snapshot.path)
    {
        error!("Failed to save snapshot: {}", e);
    }

    display_task.abort();
    info!("Weather store stopped");
}
