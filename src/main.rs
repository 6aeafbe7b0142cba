use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nba_stats_etl::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nba_stats_etl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Running {:?}", cli.command);

    match cli::run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("Validation failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
