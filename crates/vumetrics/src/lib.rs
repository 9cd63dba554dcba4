//! Top-level facade crate for vumetrics.
//!
//! Re-exports the metrics core and the harness so users can depend on a single crate.

pub mod core {
    pub use vumetrics_core::*;
}

pub mod harness {
    pub use vumetrics_harness::*;
}
