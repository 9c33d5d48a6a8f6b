//! Balance Transfer Simulator
//!
//! Runs the account chaincode against an in-memory host, either through a
//! scripted scenario or a seeded stream of random transfers.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod controller;
mod metrics;
mod scenario;

use balance_transfer_chaincode::ChaincodeConfig;
use controller::SimulationController;
use scenario::Scenario;

/// Balance Transfer Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Drive the account chaincode against an in-memory host")]
struct Args {
    /// Scenario to run: a built-in name (sample, insufficient-destination,
    /// rich-query) or a path to a JSON scenario file
    #[arg(short, long)]
    scenario: Option<String>,

    /// Number of accounts for a random run
    #[arg(long, default_value = "5")]
    accounts: usize,

    /// Number of transfers for a random run
    #[arg(long, default_value = "100")]
    transfers: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Print chaincode metrics in Prometheus text format at the end
    #[arg(long)]
    prometheus: bool,
}

fn init_logging(config: &ChaincodeConfig) {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ChaincodeConfig::from_env();
    init_logging(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        chaincode = %config.name,
        version = %config.version,
        channel = %config.channel_id,
        "Starting Balance Transfer Simulator"
    );

    let mut controller = SimulationController::new(config, args.seed);
    controller.initialize().await?;

    match &args.scenario {
        Some(name) => {
            let scenario = Scenario::load(name)?;
            controller.run_scenario(&scenario).await?;
        }
        None => {
            controller.run_random(args.accounts, args.transfers).await?;
        }
    }

    for account in controller.dump_state()? {
        info!(
            account = %account.name,
            account_id = %account.account_id,
            balance = account.balance,
            "World state"
        );
    }

    let metrics = controller.metrics();
    info!("Simulation complete");
    info!("Transactions: {}", metrics.total_invocations);
    info!("Committed: {}", metrics.committed);
    info!("Rejected: {}", metrics.rejected);
    info!("Assertions passed: {}", metrics.assertions);
    info!("Commit rate: {:.2}", metrics.commit_rate());
    info!(
        "Latency avg/p50/p99: {}/{}/{}µs",
        metrics.average_latency_us(),
        metrics.p50_latency_us(),
        metrics.p99_latency_us()
    );

    if args.prometheus {
        println!("{}", controller.chaincode().metrics().to_prometheus());
    }

    Ok(())
}
