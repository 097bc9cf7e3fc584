//! Minimum-image distances for (partially) periodic simulation boxes.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub type Position = Point3<f64>;

/// Orthorhombic box edge lengths of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxDimensions {
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
}

impl BoxDimensions {
    pub fn new(lx: f64, ly: f64, lz: f64) -> Result<Self> {
        let dims = BoxDimensions { lx, ly, lz };
        dims.validate()?;
        Ok(dims)
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, l) in ["x", "y", "z"].iter().zip(self.lengths()) {
            if !(l.is_finite() && l > 0.0) {
                return Err(AnalysisError::config(format!(
                    "box length along {} must be positive and finite, got {}",
                    axis, l
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn lengths(&self) -> [f64; 3] {
        [self.lx, self.ly, self.lz]
    }
}

/// Which axes wrap around when measuring distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicMode {
    /// Plain Euclidean distances, box data ignored
    None,
    /// Wrap x and y (membrane plane) only
    #[default]
    Lateral,
    /// Wrap all three axes
    Full,
}

impl PeriodicMode {
    #[inline]
    pub fn axes(&self) -> [bool; 3] {
        match self {
            PeriodicMode::None => [false, false, false],
            PeriodicMode::Lateral => [true, true, false],
            PeriodicMode::Full => [true, true, true],
        }
    }
}

/// Per-axis wrapping lengths; `None` where the axis does not wrap.
///
/// A missing box always yields a fully non-periodic metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metric {
    wrap: [Option<f64>; 3],
}

impl Metric {
    pub fn new(mode: PeriodicMode, dims: Option<&BoxDimensions>) -> Self {
        let mut wrap = [None; 3];
        if let Some(d) = dims {
            let lengths = d.lengths();
            for (k, periodic) in mode.axes().iter().enumerate() {
                if *periodic {
                    wrap[k] = Some(lengths[k]);
                }
            }
        }
        Metric { wrap }
    }

    pub fn euclidean() -> Self {
        Metric { wrap: [None; 3] }
    }

    #[inline]
    pub fn wrap_length(&self, axis: usize) -> Option<f64> {
        self.wrap[axis]
    }

    pub fn is_periodic(&self) -> bool {
        self.wrap.iter().any(|w| w.is_some())
    }

    /// Shortest separation vector from `a` to `b` under this metric.
    #[inline]
    pub fn delta(&self, a: &Position, b: &Position) -> Vector3<f64> {
        let mut d = b - a;
        for k in 0..3 {
            if let Some(l) = self.wrap[k] {
                d[k] -= l * (d[k] / l).round();
            }
        }
        d
    }

    #[inline]
    pub fn distance_squared(&self, a: &Position, b: &Position) -> f64 {
        self.delta(a, b).norm_squared()
    }

    pub fn distance(&self, a: &Position, b: &Position) -> f64 {
        self.distance_squared(a, b).sqrt()
    }

    /// Maps a coordinate into `[0, l)` on wrapping axes, identity elsewhere.
    #[inline]
    pub fn wrap_coordinate(&self, axis: usize, x: f64) -> f64 {
        match self.wrap[axis] {
            Some(l) => {
                let w = x.rem_euclid(l);
                // rem_euclid may round up to exactly l for tiny negatives
                if w >= l { 0.0 } else { w }
            }
            None => x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lateral_minimum_image() {
        let dims = BoxDimensions::new(10.0, 10.0, 10.0).unwrap();
        let metric = Metric::new(PeriodicMode::Lateral, Some(&dims));
        let a = Position::new(0.5, 9.5, 0.5);
        let b = Position::new(9.5, 0.5, 9.5);

        let d = metric.delta(&a, &b);
        assert!((d.x + 1.0).abs() < 1e-12);
        assert!((d.y - 1.0).abs() < 1e-12);
        // z does not wrap in lateral mode
        assert!((d.z - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_and_euclidean() {
        let dims = BoxDimensions::new(10.0, 10.0, 10.0).unwrap();
        let a = Position::new(0.5, 0.5, 0.5);
        let b = Position::new(9.5, 0.5, 9.5);

        let full = Metric::new(PeriodicMode::Full, Some(&dims));
        assert!((full.distance(&a, &b) - 2f64.sqrt()).abs() < 1e-12);

        // no box means no wrapping whatever the mode
        let open = Metric::new(PeriodicMode::Full, None);
        assert!(!open.is_periodic());
        assert!((open.distance_squared(&a, &b) - 162.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_coordinate() {
        let dims = BoxDimensions::new(4.0, 4.0, 4.0).unwrap();
        let metric = Metric::new(PeriodicMode::Lateral, Some(&dims));
        assert!((metric.wrap_coordinate(0, -1.0) - 3.0).abs() < 1e-12);
        assert!((metric.wrap_coordinate(1, 9.0) - 1.0).abs() < 1e-12);
        assert!((metric.wrap_coordinate(2, -1.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_box() {
        assert!(BoxDimensions::new(0.0, 1.0, 1.0).is_err());
        assert!(BoxDimensions::new(1.0, f64::NAN, 1.0).is_err());
    }
}
