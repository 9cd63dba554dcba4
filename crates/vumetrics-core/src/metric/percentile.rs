use std::fmt;

use crate::error::{MetricsError, Result};

/// A validated percentile rank in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentile(f64);

impl Percentile {
    pub const P50: Percentile = Percentile(50.0);
    pub const P90: Percentile = Percentile(90.0);
    pub const P95: Percentile = Percentile(95.0);
    pub const P99: Percentile = Percentile(99.0);

    pub fn new(p: f64) -> Result<Self> {
        if p.is_finite() && (0.0..=100.0).contains(&p) {
            Ok(Percentile(p))
        } else {
            Err(MetricsError::InvalidPercentile(p))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Label used in reports, e.g. `p(90)` or `p(99.9)`.
    pub fn label(&self) -> String {
        format!("p({})", self.0)
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p({})", self.0)
    }
}

/// Linear interpolation between closest ranks (Hyndman-Fan type 7).
///
/// `sorted` must be in ascending order. Returns `None` for an empty slice.
/// The result stays within `[sorted[lo], sorted[lo + 1]]` even when the gap
/// between the two ranks is wider than `f64::MAX`.
pub fn interpolate(sorted: &[f64], p: Percentile) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * p.value() / 100.0;
    let lo = h.floor() as usize;
    let lower = sorted[lo];
    let frac = h - lo as f64;
    if frac == 0.0 || lo == last {
        return Some(lower);
    }
    let upper = sorted[lo + 1];
    let v = lower * (1.0 - frac) + upper * frac;
    Some(v.clamp(lower, upper))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Percentile::new(-0.1).is_err());
        assert!(Percentile::new(100.5).is_err());
        assert!(Percentile::new(f64::NAN).is_err());
        assert!(Percentile::new(0.0).is_ok());
        assert!(Percentile::new(100.0).is_ok());
    }

    #[test]
    fn labels() {
        assert_eq!(Percentile::P90.label(), "p(90)");
        assert_eq!(Percentile::new(99.9).unwrap().to_string(), "p(99.9)");
    }

    #[test]
    fn r7_interpolation() {
        let xs = [100.0, 200.0, 300.0, 400.0];
        assert_eq!(interpolate(&xs, Percentile::P50), Some(250.0));
        assert_eq!(interpolate(&xs, Percentile::new(0.0).unwrap()), Some(100.0));
        assert_eq!(interpolate(&xs, Percentile::new(100.0).unwrap()), Some(400.0));
        // h = 3 * 0.9 = 2.7 -> 300 + 0.7 * 100
        let p90 = interpolate(&xs, Percentile::P90).unwrap();
        assert!((p90 - 370.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_spread_stays_finite_and_ordered() {
        let xs = [-f64::MAX, f64::MAX];
        let ps = [0.0, 1.0, 50.0, 90.0, 100.0].map(|p| interpolate(&xs, Percentile::new(p).unwrap()).unwrap());
        assert_eq!(ps[0], -f64::MAX);
        assert_eq!(ps[2], 0.0);
        assert_eq!(ps[4], f64::MAX);
        for w in ps.windows(2) {
            assert!(w[0].is_finite() && w[1].is_finite());
            assert!(w[0] <= w[1], "{ps:?}");
        }
    }

    #[test]
    fn single_and_empty() {
        assert_eq!(interpolate(&[7.0], Percentile::P99), Some(7.0));
        assert_eq!(interpolate(&[], Percentile::P50), None);
    }
}
