//! Harness lifecycle: explicit startup and shutdown around one metric registry.
//!
//! `start` builds the registry, router and reporter, and spawns the periodic
//! reporter when `report.interval_ms` is set. `shutdown` stops the reporter,
//! closes the router so late samples are counted as dropped, and returns the
//! final report.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

use vumetrics_core::error::Result;
use vumetrics_core::{MetricRegistry, Report, ReportStyle, Reporter, SampleRouter};

use crate::config::HarnessConfig;

pub struct Harness {
    registry: Arc<MetricRegistry>,
    router: Arc<SampleRouter>,
    reporter: Arc<Reporter>,
    style: ReportStyle,
    shutdown_tx: watch::Sender<bool>,
    ticker: Option<JoinHandle<()>>,
}

impl Harness {
    /// Build the metric pipeline from config.
    /// With a periodic report configured this must run inside a tokio runtime.
    pub fn start(cfg: &HarnessConfig) -> Result<Self> {
        let registry = Arc::new(MetricRegistry::with_options(cfg.registry_options()?));
        let router = Arc::new(SampleRouter::new(Arc::clone(&registry)));
        let reporter = Arc::new(Reporter::new(Arc::clone(&registry)).with_router(Arc::clone(&router)));
        let style = cfg.report.style()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ticker = match cfg.report.interval_ms {
            0 => None,
            ms => Some(tokio::spawn(periodic_report(
                Arc::clone(&reporter),
                style,
                Duration::from_millis(ms),
                shutdown_rx,
            ))),
        };

        tracing::info!(
            percentiles = cfg.trend.percentiles.len(),
            reservoir_size = cfg.trend.reservoir_size,
            interval_ms = cfg.report.interval_ms,
            "harness started"
        );

        Ok(Self {
            registry,
            router,
            reporter,
            style,
            shutdown_tx,
            ticker,
        })
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn router(&self) -> Arc<SampleRouter> {
        Arc::clone(&self.router)
    }

    pub fn style(&self) -> ReportStyle {
        self.style
    }

    /// On-demand report; does not stop anything.
    pub fn report(&self) -> Report {
        self.reporter.report()
    }

    pub fn render(&self, report: &Report) -> Result<String> {
        self.style.render(report)
    }

    /// Stop the periodic reporter, refuse further samples, take the final report.
    pub async fn shutdown(mut self) -> Report {
        let _ = self.shutdown_tx.send(true);
        if let Some(ticker) = self.ticker.take() {
            if let Err(e) = ticker.await {
                tracing::warn!(error = %e, "periodic reporter ended abnormally");
            }
        }
        self.router.close();

        let report = self.reporter.report();
        tracing::info!(
            metrics = report.metrics.len(),
            accepted = report.accepted,
            dropped = report.dropped_total(),
            "harness stopped"
        );
        report
    }
}

async fn periodic_report(
    reporter: Arc<Reporter>,
    style: ReportStyle,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires immediately
    tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let report = reporter.report();
                match style.render(&report) {
                    Ok(body) => tracing::info!(target: "vumetrics::report", "\n{body}"),
                    Err(e) => tracing::warn!(error = %e, "periodic report render failed"),
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
