//! Samples: one observation reported by an execution unit.

use std::collections::BTreeMap;
use std::time::SystemTime;

/// Per-sample tags, kept sorted for deterministic output.
pub type Tags = BTreeMap<String, String>;

/// One reported observation `(metric, value, tags, timestamp)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    pub value: f64,
    pub tags: Tags,
    pub timestamp: SystemTime,
}

impl Sample {
    /// Sample stamped with the current time and no tags.
    pub fn new(metric: impl Into<String>, value: f64) -> Self {
        Self {
            metric: metric.into(),
            value,
            tags: Tags::new(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn at(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}
