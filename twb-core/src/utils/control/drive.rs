//! Drive-base primitives: origin resets, odometry, continuous speed
//! commands and distance-bounded moves.

use libm::roundf;
use tracing::debug;

use crate::utils::hub::{Hub, MotorPair, MoveSignal};
use crate::utils::math::curve::CurveHandle;

use super::{DriveError, Robot, WAIT_POLL_MS};

impl<H: Hub> Robot<H> {
    /// Zeroes the drive pair's encoders, making here the odometry origin.
    pub fn reset_origin(&mut self) -> Result<(), DriveError> {
        self.hub.reset_position(MotorPair::Drive, 0, 0)?;
        Ok(())
    }

    /// Average unsigned distance covered by the two drive wheels since the
    /// last origin reset, in encoder degrees.
    ///
    /// Averaging the two sides keeps the reading meaningful while turning
    /// or arcing, when the wheels cover different distances.
    pub fn distance_traveled(&mut self) -> Result<u32, DriveError> {
        let (left, right) = self.hub.position(MotorPair::Drive)?;
        Ok(roundf((left.unsigned_abs() + right.unsigned_abs()) as f32 / 2.0) as u32)
    }

    /// Runs the drive base at the given chassis-forward speeds until the
    /// next command.
    pub fn drive_at_speed(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), DriveError> {
        let command = self.tank_command(left, right);
        self.hub.set_speeds(MotorPair::Drive, command)?;
        Ok(())
    }

    /// Actively brakes the drive base.
    pub fn brake(&mut self) -> Result<(), DriveError> {
        self.hub.hold(MotorPair::Drive)?;
        Ok(())
    }

    /// Drives a fixed encoder distance.
    ///
    /// Without a curve this is a single discrete move executed by the hub,
    /// and `wait` selects whether the call blocks until it completes. With
    /// a curve the move is driven from here instead, re-commanding speeds
    /// each poll as the profile prescribes, and always blocks.
    pub fn drive_by_degrees(
        &mut self,
        degrees: u32,
        left: i32,
        right: i32,
        curve: Option<CurveHandle>,
        wait: bool,
    ) -> Result<(), DriveError> {
        match curve {
            Some(handle) => self.drive_curved(degrees, left as f32, right as f32, handle),
            None => self.drive_discrete(degrees, left, right, wait),
        }
    }

    fn drive_discrete(
        &mut self,
        degrees: u32,
        left: i32,
        right: i32,
        wait: bool,
    ) -> Result<(), DriveError> {
        let command = self.tank_command(left as f32, right as f32);
        debug!(degrees, ?command, wait, "discrete drive move");
        // Arm the completion signal before dispatching, so a move that
        // finishes before the first poll still lands.
        let done: &'static MoveSignal = self.signals.move_done(MotorPair::Drive);
        done.reset();
        self.hub.on_move_complete(MotorPair::Drive, done)?;
        self.hub.run_for_degrees(MotorPair::Drive, degrees, command)?;
        if wait {
            while done.try_take().is_none() {
                if self.abort_pending() {
                    return self.abort_drive();
                }
                self.hub.sleep_ms(WAIT_POLL_MS);
            }
        }
        Ok(())
    }

    fn drive_curved(
        &mut self,
        degrees: u32,
        left: f32,
        right: f32,
        handle: CurveHandle,
    ) -> Result<(), DriveError> {
        debug!(degrees, curve = handle.index(), "curved drive move");
        self.reset_origin()?;
        loop {
            let traveled = self.distance_traveled()?;
            if traveled >= degrees {
                break;
            }
            if self.abort_pending() {
                return self.abort_drive();
            }
            let progress = traveled as f32 / degrees as f32;
            let multiplier = self.curves.evaluate(handle, progress)?;
            self.drive_at_speed(left * multiplier, right * multiplier)?;
        }
        self.brake()
    }
}
