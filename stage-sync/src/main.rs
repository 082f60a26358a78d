use std::error::Error;

use stage_sync::{Dependencies, SyncConfig, SyncError};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Firestore stage upload");

    if let Err(e) = run().await {
        error!(error = %e, "Stage upload aborted");

        let mut source = e.source();
        while let Some(err) = source {
            error!("  Caused by: {}", err);
            source = err.source();
        }

        std::process::exit(1);
    }
}

async fn run() -> Result<(), SyncError> {
    let config = SyncConfig::from_env()?;
    let dependencies = Dependencies::new(&config).await?;

    // Per-file failures are logged by the loader and do not affect the exit code.
    dependencies.loader.upload_all().await?;

    info!("All stages uploaded");
    Ok(())
}
