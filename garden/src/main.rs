//! Memory garden headless driver.
//!
//! Loads a garden configuration, restores saved progress from a directory and
//! accepts line commands on stdin, printing garden events as they fire.
//!
//! ```bash
//! cargo run -p garden -- --config garden.json --save-dir saves
//! ```
//!
//! `GARDEN_CONFIG` and `GARDEN_SAVE_DIR` (also read from `.env`) supply the
//! same values. Logging is controlled with `RUST_LOG`.

mod headless;

use garden_core::{FileStore, Garden, GardenConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Where the configuration and saves live.
#[derive(Debug, Clone)]
struct Options {
    config: Option<PathBuf>,
    save_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = parse_options(&args);
    let config = match &options.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading garden configuration");
            GardenConfig::load(path).await?
        }
        None => {
            tracing::info!("No configuration given, using the sample garden");
            garden_core::testing::sample_config(4)
        }
    };

    let store = Arc::new(FileStore::new(&options.save_dir));
    let garden = Garden::initialize(config, store).await?;

    headless::run(garden).await
}

fn parse_options(args: &[String]) -> Options {
    let mut config = std::env::var("GARDEN_CONFIG").ok().map(PathBuf::from);
    let mut save_dir = std::env::var("GARDEN_SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("saves"));

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                if let Some(value) = iter.next() {
                    config = Some(PathBuf::from(value));
                }
            }
            "--save-dir" | "-s" => {
                if let Some(value) = iter.next() {
                    save_dir = PathBuf::from(value);
                }
            }
            other => tracing::warn!(arg = other, "Ignoring unknown argument"),
        }
    }

    Options { config, save_dir }
}

fn print_help() {
    println!("Memory garden headless driver");
    println!();
    println!("Usage: garden [--config <path>] [--save-dir <dir>]");
    println!();
    println!("Options:");
    println!("  -c, --config <path>    Garden configuration (JSON). Env: GARDEN_CONFIG");
    println!("  -s, --save-dir <dir>   Directory for saved progress. Env: GARDEN_SAVE_DIR");
    println!("  -h, --help             Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        std::iter::once("garden")
            .chain(raw.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_options_flags() {
        let options = parse_options(&args(&["--config", "garden.json", "-s", "/tmp/saves"]));
        assert_eq!(options.config, Some(PathBuf::from("garden.json")));
        assert_eq!(options.save_dir, PathBuf::from("/tmp/saves"));
    }

    #[test]
    fn test_parse_options_ignores_dangling_flag() {
        let options = parse_options(&args(&["--config"]));
        assert_eq!(options.config, std::env::var("GARDEN_CONFIG").ok().map(PathBuf::from));
    }
}
