use std::time::Duration;

use anyhow::Result;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

use relay_node::{NodeConfig, logging, stdio};

/// How long queued outbound frames may take to reach stdout after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = NodeConfig::from_env();
    logging::setup_logging(&config)?;

    let (builder, outbound) =
        relay_node::builder(&config)?.channel_link(config.front_end.clone(), config.stdio_encoding);
    let mut runtime = builder.build()?;

    let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_buffer);
    runtime.serve(config.front_end.clone(), inbound_rx);

    let writer = tokio::spawn(stdio::write_frames(tokio::io::stdout(), outbound));
    let reader = tokio::spawn(stdio::read_frames(
        BufReader::new(tokio::io::stdin()),
        config.stdio_encoding,
        inbound_tx,
    ));

    info!(
        node = %config.runtime.node_id,
        front_end = %config.front_end,
        encoding = %config.stdio_encoding,
        "relay node ready"
    );

    tokio::select! {
        result = reader => match result {
            Ok(Ok(())) => info!("stdin closed"),
            Ok(Err(err)) => warn!(error = %err, "stdin reader failed"),
            Err(err) => warn!(error = %err, "stdin reader panicked"),
        },
        _ = tokio::signal::ctrl_c() => info!("interrupt received"),
    }

    // Collectors ended here still emit their end packets; the link closes
    // once the last runtime handle is gone.
    runtime.shutdown().await?;

    match tokio::time::timeout(DRAIN_TIMEOUT, writer).await {
        Ok(Ok(result)) => result?,
        Ok(Err(err)) => warn!(error = %err, "stdout writer panicked"),
        Err(_) => warn!("stdout writer did not drain in time"),
    }

    info!("relay node stopped");
    Ok(())
}
