//! # Mathematical Utilities
//!
//! Pure, hardware-free helpers used by the maneuver layer.

pub mod curve;
