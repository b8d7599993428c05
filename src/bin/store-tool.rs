//! Development tool for inspecting and editing store snapshots.
//!
//! Usage:
//!   cargo run --bin store-tool -- show
//!   cargo run --bin store-tool -- move 0,0 1,1
//!   cargo run --bin store-tool -- seed
//!
//! Every command loads the snapshot into a [`SensorStore`] first, so edits
//! go through the same rules as the running daemon.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use weather_store::config::{self, Config};
use weather_store::display;
use weather_store::input::{Refresher, SimulatedSource};
use weather_store::store::{Position, SensorStore, Snapshot};

#[derive(Parser)]
#[command(name = "store-tool")]
#[command(about = "Inspect and edit weather store snapshots")]
struct Cli {
    /// Snapshot file (defaults to SNAPSHOT_PATH or the data directory)
    #[arg(long, env = "SNAPSHOT_PATH")]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the groups and sensors in the snapshot
    Show,
    /// Move a sensor, positions given as GROUP,SENSOR
    Move {
        #[arg(value_parser = parse_position)]
        from: Position,
        #[arg(value_parser = parse_position)]
        to: Position,
    },
    /// Write simulated data to the snapshot file
    Seed,
}

fn parse_position(value: &str) -> Result<Position, String> {
    let (group, sensor) = value
        .split_once(',')
        .ok_or_else(|| format!("expected GROUP,SENSOR, got '{}'", value))?;
    let group = group
        .trim()
        .parse()
        .map_err(|e| format!("bad group index '{}': {}", group, e))?;
    let sensor = sensor
        .trim()
        .parse()
        .map_err(|e| format!("bad sensor index '{}': {}", sensor, e))?;
    Ok(Position::new(group, sensor))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let path = cli
        .snapshot
        .unwrap_or_else(|| Config::default().snapshot.path);

    let store = SensorStore::new();

    match cli.command {
        Commands::Show => {
            store.restore(Snapshot::load(&path)?);
            for line in display::render(&store) {
                println!("{}", line);
            }
        }
        Commands::Move { from, to } => {
            store.restore(Snapshot::load(&path)?);
            store.move_sensor(from, to)?;
            store.snapshot().save(&path)?;
            println!("Moved sensor {} -> {}", from, to);
            for line in display::render(&store) {
                println!("{}", line);
            }
        }
        Commands::Seed => {
            let store = Arc::new(store);
            let refresher = Refresher::new(
                store.clone(),
                Arc::new(SimulatedSource::new()),
                Duration::from_secs(1),
            );
            refresher.refresh_once().await?;
            store.snapshot().save(&path)?;
            println!(
                "Seeded {} with {} groups and {} sensors",
                path.display(),
                store.groups().len(),
                store.sensor_count()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("1,2").unwrap(), Position::new(1, 2));
        assert_eq!(parse_position(" 0 , 3 ").unwrap(), Position::new(0, 3));
        assert!(parse_position("1").is_err());
        assert!(parse_position("a,1").is_err());
        assert!(parse_position("1,-1").is_err());
    }
}
