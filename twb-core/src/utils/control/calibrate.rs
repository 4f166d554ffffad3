//! Gyro drift calibration.

use tracing::info;

use crate::utils::hub::Hub;

use super::{DriveError, Robot};

/// Forward run-up before the rotation sweep, in encoder degrees.
const CAL_RUNUP_DEG: u32 = 250;
/// Rotation sweep, sized to one full revolution of the chassis.
const CAL_SWEEP_DEG: u32 = 2560;
/// Reverse leg closing the loop, in encoder degrees.
const CAL_RETURN_DEG: u32 = 500;
/// Wheel speed of every calibration leg.
const CAL_SPEED: i32 = 25;
/// Divisor turning the residual yaw into the drift-correction factor.
const CAL_TRIM_DIVISOR: f32 = 5.0;

impl<H: Hub> Robot<H> {
    /// Measures gyro drift and installs a correction factor on the hub.
    ///
    /// Zeroes the yaw, drives a short closed loop (run-up, one full
    /// rotation, reverse) and reads the yaw again. On an ideal gyro the
    /// loop ends where it started, so the residual is accumulated drift;
    /// a fifth of it is handed to the hub as the correction factor of the
    /// final yaw reset.
    pub fn calibrate_gyro(&mut self) -> Result<(), DriveError> {
        self.hub.reset_yaw(0, 0.0)?;
        self.drive_by_degrees(CAL_RUNUP_DEG, CAL_SPEED, CAL_SPEED, None, true)?;
        self.drive_by_degrees(CAL_SWEEP_DEG, -CAL_SPEED, CAL_SPEED, None, true)?;
        self.drive_by_degrees(CAL_RETURN_DEG, -CAL_SPEED, -CAL_SPEED, None, true)?;
        let residual = self.hub.yaw()?;
        self.hub.reset_yaw(0, residual as f32 / CAL_TRIM_DIVISOR)?;
        info!(residual, "gyro calibrated");
        Ok(())
    }
}
