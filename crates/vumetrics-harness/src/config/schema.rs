use serde::Deserialize;
use vumetrics_core::error::{MetricsError, Result};
use vumetrics_core::metric::validate_name;
use vumetrics_core::{Percentile, RegistryOptions, ReportStyle, ReservoirPolicy};

use crate::scenario::ITERATIONS;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    pub version: u32,

    #[serde(default)]
    pub trend: TrendSection,

    #[serde(default)]
    pub report: ReportSection,

    #[serde(default)]
    pub load: LoadSection,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            version: 1,
            trend: TrendSection::default(),
            report: ReportSection::default(),
            load: LoadSection::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.trend.validate()?;
        self.report.validate()?;
        self.load.validate()?;

        Ok(())
    }

    /// Registry options derived from the `trend` section.
    pub fn registry_options(&self) -> Result<RegistryOptions> {
        let percentiles = self
            .trend
            .percentiles
            .iter()
            .map(|p| Percentile::new(*p))
            .collect::<Result<Vec<_>>>()?;
        let reservoir = match self.trend.reservoir_size {
            0 => ReservoirPolicy::Unbounded,
            capacity => ReservoirPolicy::Bounded {
                capacity,
                seed: self.trend.reservoir_seed,
            },
        };
        Ok(RegistryOptions {
            percentiles,
            reservoir,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendSection {
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,

    /// 0 keeps every value.
    #[serde(default)]
    pub reservoir_size: usize,

    #[serde(default)]
    pub reservoir_seed: Option<u64>,
}

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            percentiles: default_percentiles(),
            reservoir_size: 0,
            reservoir_seed: None,
        }
    }
}

impl TrendSection {
    pub fn validate(&self) -> Result<()> {
        for p in &self.percentiles {
            Percentile::new(*p)
                .map_err(|_| MetricsError::Config(format!("trend.percentiles: {p} not in 0..=100")))?;
        }
        if self.reservoir_size > 10_000_000 {
            return Err(MetricsError::Config(
                "trend.reservoir_size must be at most 10000000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// 0 disables the periodic report; the final report is always produced.
    #[serde(default)]
    pub interval_ms: u64,

    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            interval_ms: 0,
            format: default_format(),
        }
    }
}

impl ReportSection {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms != 0 && !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(MetricsError::Config(
                "report.interval_ms must be 0 or between 100 and 3600000".into(),
            ));
        }
        self.style()?;
        Ok(())
    }

    pub fn style(&self) -> Result<ReportStyle> {
        self.format
            .parse::<ReportStyle>()
            .map_err(|_| MetricsError::Config(format!("report.format: unsupported {:?}", self.format)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadSection {
    #[serde(default = "default_vus")]
    pub vus: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Trend the synthetic scenario records waiting time into.
    #[serde(default = "default_metric")]
    pub metric: String,

    #[serde(default)]
    pub think_time_ms: u64,
}

impl Default for LoadSection {
    fn default() -> Self {
        Self {
            vus: default_vus(),
            iterations: default_iterations(),
            metric: default_metric(),
            think_time_ms: 0,
        }
    }
}

impl LoadSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.vus) {
            return Err(MetricsError::Config(
                "load.vus must be between 1 and 10000".into(),
            ));
        }
        if self.iterations == 0 {
            return Err(MetricsError::Config("load.iterations must be at least 1".into()));
        }
        if self.think_time_ms > 60_000 {
            return Err(MetricsError::Config(
                "load.think_time_ms must be at most 60000".into(),
            ));
        }
        validate_name(&self.metric)
            .map_err(|e| MetricsError::Config(format!("load.metric: {e}")))?;
        if self.metric == ITERATIONS {
            return Err(MetricsError::Config(format!(
                "load.metric: {ITERATIONS:?} is reserved for the iteration counter"
            )));
        }
        Ok(())
    }
}

fn default_percentiles() -> Vec<f64> {
    vec![90.0, 95.0]
}
fn default_format() -> String {
    "text".into()
}
fn default_vus() -> u32 {
    10
}
fn default_iterations() -> u32 {
    100
}
fn default_metric() -> String {
    "my_trend".into()
}
