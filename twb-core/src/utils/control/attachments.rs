//! Attachment motor primitives.
//!
//! Attachments run on the lettered ports and, unlike the drive base, take
//! their speeds unscaled and unmirrored.

use tracing::{debug, warn};

use crate::utils::hub::{Hub, MotorCommand, MotorPair, MoveSignal, Port};

use super::{DriveError, Robot, WAIT_POLL_MS};

impl<H: Hub> Robot<H> {
    /// Runs the attachment motor on `port` through `degrees` at `speed`.
    ///
    /// With `wait`, the call busy-polls the motor's busy flag until the
    /// move ends; without it, the move keeps running while the mission
    /// moves on.
    pub fn move_attachment(
        &mut self,
        port: Port,
        degrees: u32,
        speed: i32,
        wait: bool,
    ) -> Result<(), DriveError> {
        debug!(?port, degrees, speed, wait, "attachment move");
        self.hub.motor_run_for_degrees(port, degrees, speed)?;
        if wait {
            while self.hub.motor_busy(port)? {
                if self.abort_pending() {
                    warn!(?port, "attachment move aborted");
                    self.hub.motor_hold(port)?;
                    return Err(DriveError::Aborted);
                }
            }
        }
        Ok(())
    }

    /// Runs both attachment motors through `degrees` as one discrete move,
    /// completing when the slower side finishes.
    pub fn move_attachment_pair(
        &mut self,
        degrees: u32,
        left: i32,
        right: i32,
        wait: bool,
    ) -> Result<(), DriveError> {
        let command = MotorCommand::new(left, right);
        debug!(degrees, ?command, wait, "attachment pair move");
        let done: &'static MoveSignal = self.signals.move_done(MotorPair::Attachment);
        done.reset();
        self.hub.on_move_complete(MotorPair::Attachment, done)?;
        self.hub.run_for_degrees(MotorPair::Attachment, degrees, command)?;
        if wait {
            while done.try_take().is_none() {
                if self.abort_pending() {
                    warn!("attachment pair move aborted");
                    self.hub.hold(MotorPair::Attachment)?;
                    return Err(DriveError::Aborted);
                }
                self.hub.sleep_ms(WAIT_POLL_MS);
            }
        }
        Ok(())
    }

    /// Starts the attachment motor on `port` running continuously.
    pub fn start_attachment(
        &mut self,
        port: Port,
        speed: i32,
    ) -> Result<(), DriveError> {
        self.hub.motor_run_at_speed(port, speed)?;
        Ok(())
    }

    /// Brakes the attachment motor on `port`.
    pub fn hold_attachment(
        &mut self,
        port: Port,
    ) -> Result<(), DriveError> {
        self.hub.motor_hold(port)?;
        Ok(())
    }

    /// Zeroes the attachment pair's encoders.
    pub fn reset_attachments(&mut self) -> Result<(), DriveError> {
        self.hub.reset_position(MotorPair::Attachment, 0, 0)?;
        Ok(())
    }
}
