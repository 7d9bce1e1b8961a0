mod scenarios;

use std::sync::Arc;

use mn_node::Network;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs the four network scenarios back to back against one shared network,
/// the way a live deployment would accumulate history. Outcomes are logged;
/// the process exits 0 once every scenario has run.
fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let network = Arc::new(Network::new());

    let nominal = scenarios::nominal(&network)?;
    let tamper = scenarios::tamper_rejection(&network)?;
    scenarios::majority_attack(&network)?;
    let availability = scenarios::availability(&network)?;

    info!("shutting down the network");
    network.shutdown();

    info!(nominal, tamper, availability, "scenario outcomes");
    Ok(())
}
