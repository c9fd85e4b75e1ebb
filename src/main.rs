use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use tickmill::config;
use tickmill::order::book::Book;
use tickmill::sim::MarketSimulator;
use tickmill::telemetry::{Publisher, Sampler};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tickmill", about = "Tickmill market simulator")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Simulate,
}

fn init_logging(cfg: &config::AppConfig) {
    match cfg.logger.format {
        config::LogFormat::JSON => {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(cfg.logger.level)
                .with_current_span(true)
                .init();
        }
        config::LogFormat::COMPACT => {
            tracing_subscriber::fmt()
                .compact()
                .with_max_level(cfg.logger.level)
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = config::AppConfig::load(cli.config_path.as_ref()).expect("could not load config");

    init_logging(&config);

    match cli.command {
        Commands::Simulate => simulate(&config).await,
    }
}

async fn simulate(cfg: &config::AppConfig) {
    let book = Arc::new(RwLock::new(Book::new(cfg.market.symbol.clone())));
    let mut sim =
        MarketSimulator::new(book.clone(), cfg.market.base_price).batch_size(cfg.market.batch_size);
    let sampler = Sampler::new(book, sim.stats_handle(), cfg.telemetry.depth);

    sim.start(cfg.market.target_ops);
    let mut publisher = Publisher::start(
        sampler,
        Duration::from_millis(cfg.telemetry.interval_ms),
        |snapshot| match serde_json::to_string(&snapshot) {
            Ok(json) => info!(target: "telemetry", "{json}"),
            Err(err) => error!("could not encode telemetry snapshot: {err}"),
        },
    );

    tokio::signal::ctrl_c()
        .await
        .expect("could not listen for shutdown signal");
    info!("shutting down");
    publisher.stop();
    sim.stop();
}
