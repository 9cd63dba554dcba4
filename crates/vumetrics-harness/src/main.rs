//! vumetrics harness binary.
//!
//! - Config: `vumetrics.yaml` in the working directory, defaults otherwise
//! - Runs the synthetic scenario with `load.vus` virtual users
//! - Prints the final report (text or json) to stdout

use std::sync::Arc;

use tokio::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use vumetrics_core::error::Result;
use vumetrics_harness::runner::{run_load, LoadPlan};
use vumetrics_harness::scenario::{Scenario, SyntheticScenario};
use vumetrics_harness::{config, Harness};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(body) => println!("{body}"),
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "vumetrics-harness failed");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<String> {
    let cfg = config::load_or_default("vumetrics.yaml")?;
    let harness = Harness::start(&cfg)?;

    let scenario = SyntheticScenario::new(cfg.load.metric.clone())
        .with_think_time(Duration::from_millis(cfg.load.think_time_ms));
    scenario.setup(&harness.registry())?;

    tracing::info!(vus = cfg.load.vus, iterations = cfg.load.iterations, "load starting");
    run_load(LoadPlan::from(&cfg.load), Arc::new(scenario), harness.router()).await;

    let style = harness.style();
    let report = harness.shutdown().await;
    if let Some(m) = report.metric(&cfg.load.metric) {
        tracing::info!(metric = %m.name, snapshot = ?m.snapshot, "final");
    }
    style.render(&report)
}
