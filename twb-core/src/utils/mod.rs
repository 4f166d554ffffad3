//! # Utility Modules for the Two-Wheel Bot
//!
//! - `control`: drive, attachment, heading and line-follow maneuvers
//! - `hub`: the hardware boundary (motor pairs, gyro, light sensors) and a
//!   simulated hub for host-side runs
//! - `math`: speed-curve profiles evaluated along a maneuver

pub mod control;
pub mod hub;
pub mod math;

pub use control::{Direction, DriveConfig, DriveError, LineFollowStats, LineSide, Robot};
pub use hub::{Hub, HubError, HubSignals, MockHub, MotorCommand, MotorPair, MoveSignal, Port};
pub use math::curve::{CurveError, CurveHandle, CurveRegistry, SpeedCurve};
