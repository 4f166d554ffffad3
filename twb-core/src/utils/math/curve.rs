//! Speed-curve profiles for distance-bounded maneuvers.
//!
//! A curve maps maneuver progress (distance covered over target distance,
//! nominally `0.0..=1.0`) to a speed multiplier. Profiles are registered once
//! at startup and addressed by a [`CurveHandle`] from then on, so the
//! per-poll lookup in a drive loop is a plain array index.
//!
//! Progress is deliberately not clamped: a maneuver that overshoots its
//! target distance keeps extrapolating the profile on its final polls.
//!
//! # Example
//!
//! ```rust
//! use twb_core::utils::math::curve::{CurveRegistry, SpeedCurve};
//!
//! let mut curves = CurveRegistry::new();
//! let ramp = curves
//!     .register(SpeedCurve::Linear { slope: -0.5, intercept: 1.0 })
//!     .unwrap();
//! assert_eq!(curves.evaluate(ramp, 0.0), Ok(1.0));
//! assert_eq!(curves.evaluate(ramp, 1.0), Ok(0.5));
//! ```

use heapless::Vec;
use serde::{Deserialize, Serialize};

/// Maximum number of profiles a registry can hold.
///
/// A competition run registers a handful of profiles at startup; the cap
/// keeps the registry a fixed-size allocation.
pub const CURVE_CAPACITY: usize = 32;

/// A speed profile evaluated along a maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum SpeedCurve {
    /// `multiplier = slope * progress + intercept`.
    Linear { slope: f32, intercept: f32 },
}

impl SpeedCurve {
    /// Evaluates the profile at the given progress.
    pub fn multiplier(
        &self,
        progress: f32,
    ) -> f32 {
        match *self {
            SpeedCurve::Linear { slope, intercept } => slope * progress + intercept,
        }
    }
}

/// Stable identifier for a registered [`SpeedCurve`].
///
/// Handles are append-order indices and stay valid for the life of the
/// registry; profiles are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveHandle(usize);

impl CurveHandle {
    /// Index of the profile in registration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised by [`CurveRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// The handle does not name a registered profile.
    UnknownHandle(CurveHandle),
    /// The registry already holds [`CURVE_CAPACITY`] profiles.
    RegistryFull,
}

/// Fixed-capacity store of speed profiles.
#[derive(Debug, Default)]
pub struct CurveRegistry {
    curves: Vec<SpeedCurve, CURVE_CAPACITY>,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self { curves: Vec::new() }
    }

    /// Appends a profile and returns its handle.
    pub fn register(
        &mut self,
        curve: SpeedCurve,
    ) -> Result<CurveHandle, CurveError> {
        self.curves.push(curve).map_err(|_| CurveError::RegistryFull)?;
        Ok(CurveHandle(self.curves.len() - 1))
    }

    /// Evaluates the profile named by `handle` at `progress`.
    pub fn evaluate(
        &self,
        handle: CurveHandle,
        progress: f32,
    ) -> Result<f32, CurveError> {
        let curve = self
            .curves
            .get(handle.index())
            .ok_or(CurveError::UnknownHandle(handle))?;
        Ok(curve.multiplier(progress))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_matches_closed_form() {
        let curve = SpeedCurve::Linear { slope: -0.5, intercept: 1.0 };
        assert_eq!(curve.multiplier(0.0), 1.0);
        assert_eq!(curve.multiplier(0.5), 0.75);
        assert_eq!(curve.multiplier(1.0), 0.5);
    }

    #[test]
    fn progress_is_not_clamped() {
        let curve = SpeedCurve::Linear { slope: 2.0, intercept: 0.25 };
        assert_eq!(curve.multiplier(1.5), 3.25);
        assert_eq!(curve.multiplier(-0.5), -0.75);
    }

    #[test]
    fn handles_follow_registration_order() {
        let mut registry = CurveRegistry::new();
        let first = registry
            .register(SpeedCurve::Linear { slope: 0.0, intercept: 1.0 })
            .unwrap();
        let second = registry
            .register(SpeedCurve::Linear { slope: -1.0, intercept: 1.0 })
            .unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.evaluate(second, 1.0), Ok(0.0));
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let mut registry = CurveRegistry::new();
        let handle = registry
            .register(SpeedCurve::Linear { slope: 0.0, intercept: 1.0 })
            .unwrap();
        let other = CurveRegistry::new();
        assert_eq!(
            other.evaluate(handle, 0.0),
            Err(CurveError::UnknownHandle(handle))
        );
    }

    #[test]
    fn registry_rejects_overflow() {
        let mut registry = CurveRegistry::new();
        for _ in 0..CURVE_CAPACITY {
            registry
                .register(SpeedCurve::Linear { slope: 0.0, intercept: 1.0 })
                .unwrap();
        }
        assert_eq!(
            registry.register(SpeedCurve::Linear { slope: 0.0, intercept: 1.0 }),
            Err(CurveError::RegistryFull)
        );
    }

    #[test]
    fn curves_deserialize_from_tagged_form() {
        let curve: SpeedCurve =
            serde_json::from_str(r#"{"curve":"linear","slope":-0.5,"intercept":1.0}"#).unwrap();
        assert_eq!(curve, SpeedCurve::Linear { slope: -0.5, intercept: 1.0 });
    }
}
