//! Linkfind
//!
//! Keyword search over a relationship graph of tables and layers.

use clap::Parser;
use linkfind::{CliConfig, init_logging, run};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling search");
                cancel.cancel();
            }
        });
    }

    let response = run(&config, cancel).await?;
    info!(
        entries = response.len(),
        cancelled = response.cancelled,
        threshold_reached = response.threshold_reached,
        "Search finished"
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
