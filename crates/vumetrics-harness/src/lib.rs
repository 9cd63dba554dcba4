//! vumetrics harness library entry.
//!
//! Plays the collaborators around the metrics core: config loading, explicit
//! startup/shutdown of the metric pipeline, a periodic reporter, and a
//! synthetic virtual-user load source. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod config;
pub mod harness;
pub mod runner;
pub mod scenario;

pub use harness::Harness;
