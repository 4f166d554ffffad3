//! Gyro-referenced maneuvers: point turns and heading-corrected straights.

use tracing::debug;

use crate::utils::hub::Hub;
use crate::utils::math::curve::CurveHandle;

use super::{DriveError, Robot};

/// Travel direction of a heading-corrected drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Settle passes of a point turn.
const TURN_PASSES: i32 = 5;
/// Constant torque bias added to the proportional turn command, keeping the
/// wheels moving against static friction near the target.
const TURN_BIAS: f32 = 70.0;
/// Wheel-speed units per degree of heading error while driving straight.
const STEER_FACTOR: f32 = 10.0;

impl<H: Hub> Robot<H> {
    /// Turns in place to an absolute gyro heading.
    ///
    /// The turn settles over five passes with successively tighter
    /// tolerance bands and gentler gains; the final pass leaves the yaw
    /// within five degrees of `heading`. The heading error is not wrapped,
    /// so targets must lie within the gyro's reporting range. Also zeroes
    /// the odometry origin.
    pub fn turn_to_heading(
        &mut self,
        heading: i32,
    ) -> Result<(), DriveError> {
        debug!(heading, "point turn");
        self.reset_origin()?;
        for pass in 0..TURN_PASSES {
            let tolerance = 10 - pass;
            let divisor = (pass + 10) as f32;
            loop {
                let yaw = self.hub.yaw()?;
                if yaw > heading - tolerance && yaw < heading + tolerance {
                    break;
                }
                if self.abort_pending() {
                    return self.abort_drive();
                }
                let error = (heading - yaw) as f32;
                if error > 0.0 {
                    self.drive_at_speed(
                        (error + TURN_BIAS) / divisor,
                        (-error - TURN_BIAS) / divisor,
                    )?;
                } else {
                    self.drive_at_speed(
                        (error - TURN_BIAS) / divisor,
                        (-error + TURN_BIAS) / divisor,
                    )?;
                }
            }
        }
        self.brake()
    }

    /// Drives a heading-corrected straight line for a fixed distance.
    ///
    /// Each poll biases the wheel speeds by the signed heading error times
    /// `gain`, on top of the base speed, steering the chassis back onto
    /// `heading` while it covers `degrees`. `Reverse` drives backward along
    /// the same corrected heading. An optional speed curve rescales the
    /// base speed as the move progresses.
    pub fn drive_heading(
        &mut self,
        degrees: u32,
        speed: i32,
        gain: f32,
        heading: i32,
        direction: Direction,
        curve: Option<CurveHandle>,
    ) -> Result<(), DriveError> {
        debug!(degrees, speed, heading, ?direction, "heading drive");
        let raw = speed as f32;
        // The drive scale applies twice on this path: once here and once
        // more in tank_command.
        let mut base = raw * self.config.speed_scale;
        self.reset_origin()?;
        loop {
            let traveled = self.distance_traveled()?;
            if traveled >= degrees {
                break;
            }
            if self.abort_pending() {
                return self.abort_drive();
            }
            if let Some(handle) = curve {
                let progress = traveled as f32 / degrees as f32;
                base = raw * self.config.speed_scale * self.curves.evaluate(handle, progress)?;
            }
            let yaw = self.hub.yaw()?;
            let left = (heading - yaw) as f32 * STEER_FACTOR;
            let right = (yaw - heading) as f32 * STEER_FACTOR;
            match direction {
                Direction::Forward => {
                    self.drive_at_speed(left * gain + base, right * gain + base)?
                }
                Direction::Reverse => {
                    self.drive_at_speed(right * -gain - base, left * -gain - base)?
                }
            }
        }
        self.brake()
    }
}
