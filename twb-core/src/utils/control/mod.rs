//! # Maneuver Layer
//!
//! [`Robot`] owns the hub plus the run-wide tuning and sequences one
//! maneuver at a time on the caller's thread:
//!
//! - `drive`: origin resets, odometry and distance-bounded moves
//! - `heading`: gyro point turns and heading-corrected straights
//! - `line`: adaptive and fixed-gain line following
//! - `attachments`: single and paired attachment motors
//! - `calibrate`: the gyro drift calibration sweep
//!
//! Maneuvers brake the motors they used when they run to completion, and
//! an abort brakes them before reporting [`DriveError::Aborted`]. A hub
//! error instead propagates immediately and leaves the last speed command
//! in force, and a dispatch with `wait` false returns while the move is
//! still running; stopping is the caller's job in both of those cases.

pub mod attachments;
pub mod calibrate;
pub mod drive;
pub mod heading;
pub mod line;

pub use heading::Direction;
pub use line::{LineFollowStats, LineSide};

use libm::roundf;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::utils::hub::{Hub, HubError, HubSignals, MotorCommand, MotorPair};
use crate::utils::math::curve::{CurveError, CurveHandle, CurveRegistry, SpeedCurve};

/// Poll interval while blocking on a discrete-move completion signal.
pub(crate) const WAIT_POLL_MS: u32 = 1;

/// Run-wide tuning for the drive base.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Multiplier applied to every drive-motor speed on its way to the hub,
    /// compensating for battery sag and gearing. `1.0` is nominal.
    pub speed_scale: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self { speed_scale: 1.0 }
    }
}

/// Errors surfaced by maneuvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveError {
    /// The hub rejected a command or has no such device.
    Hub(HubError),
    /// A speed-curve lookup failed.
    Curve(CurveError),
    /// The supervisor requested an abort; the motors in use were braked.
    Aborted,
}

impl From<HubError> for DriveError {
    fn from(err: HubError) -> Self {
        DriveError::Hub(err)
    }
}

impl From<CurveError> for DriveError {
    fn from(err: CurveError) -> Self {
        DriveError::Curve(err)
    }
}

/// Drive base, attachments and sensors behind one context.
///
/// Constructed once at startup from a hub implementation, the tuning config
/// and the embedder-owned [`HubSignals`] block.
pub struct Robot<H: Hub> {
    hub: H,
    config: DriveConfig,
    curves: CurveRegistry,
    signals: &'static HubSignals,
}

impl<H: Hub> Robot<H> {
    pub fn new(
        hub: H,
        config: DriveConfig,
        signals: &'static HubSignals,
    ) -> Self {
        info!(speed_scale = config.speed_scale as f64, "robot context ready");
        Self {
            hub,
            config,
            curves: CurveRegistry::new(),
            signals,
        }
    }

    /// Direct access to the hub, mainly for demos and tests.
    pub fn hub_mut(&mut self) -> &mut H {
        &mut self.hub
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// The signal block this robot polls for aborts and move completions.
    pub fn signals(&self) -> &'static HubSignals {
        self.signals
    }

    /// Registers a speed profile for later drive maneuvers.
    pub fn register_curve(
        &mut self,
        curve: SpeedCurve,
    ) -> Result<CurveHandle, DriveError> {
        Ok(self.curves.register(curve)?)
    }

    /// Blocks for at least `ms` milliseconds.
    pub fn wait_ms(
        &mut self,
        ms: u32,
    ) {
        self.hub.sleep_ms(ms);
    }

    /// Redefines the current heading as zero.
    ///
    /// Also clears any drift-correction factor; run
    /// [`calibrate_gyro`](Robot::calibrate_gyro) afterwards to re-derive it.
    pub fn reset_yaw(&mut self) -> Result<(), DriveError> {
        self.hub.reset_yaw(0, 0.0)?;
        Ok(())
    }

    /// Scales and mirrors a chassis-frame tank command into hub units.
    ///
    /// The left drive motor is mounted mirrored, so its speed is negated
    /// here; everything above this point reasons in chassis-forward speeds.
    pub(crate) fn tank_command(
        &self,
        left: f32,
        right: f32,
    ) -> MotorCommand {
        MotorCommand::new(
            roundf(-left * self.config.speed_scale) as i32,
            roundf(right * self.config.speed_scale) as i32,
        )
    }

    pub(crate) fn abort_pending(&self) -> bool {
        self.signals.abort_requested()
    }

    /// Brakes the drive base and reports the abort.
    pub(crate) fn abort_drive(&mut self) -> Result<(), DriveError> {
        warn!("maneuver aborted, braking drive base");
        self.hub.hold(MotorPair::Drive)?;
        Err(DriveError::Aborted)
    }
}
