//! Line following along a mat line's edge.
//!
//! Two families live here: an adaptive follower that retunes its steering
//! gain from light-band occupancy while it runs, and a fixed-gain pair that
//! steer with opposite sign conventions for the two edges of a line.

use libm::fabsf;
use tracing::{debug, info};

use crate::utils::hub::{Hub, Port};

use super::{DriveError, Robot};

/// Which wheel the dark-anchored steering term feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    Left,
    Right,
}

/// Post-run statistics of a line follow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFollowStats {
    /// Control-loop iterations executed.
    pub samples: u32,
    /// Average control rate over the run, in samples per second.
    pub sample_rate_hz: f32,
    /// Mean signed deviation of the light reading from the target.
    pub mean_error: f32,
}

/// Reflected-light value the adaptive follower regulates toward.
const LIGHT_TARGET: f32 = 70.0;
/// Band around the target within which the adaptive gain decays.
const LIGHT_BAND: f32 = 10.0;
/// Upper clamp of the adaptive gain.
const GAIN_CEILING: f32 = 0.3;
/// Gain growth per out-of-band sample, scaled by base speed.
const GAIN_GROWTH: f32 = 0.000_01;
/// Gain decay per in-band sample, scaled by base speed.
const GAIN_DECAY: f32 = 0.000_1;
/// Anchors of the two steering terms: full dark and full bright readings.
const DARK_PIVOT: f32 = 35.0;
const BRIGHT_PIVOT: f32 = 100.0;

impl<H: Hub> Robot<H> {
    /// Follows a line edge for `degrees` with the adaptive-gain law.
    ///
    /// Samples outside the light band grow the steering gain slowly; in-band
    /// samples decay it an order of magnitude faster, so a cleanly tracked
    /// line converges toward straight driving. The gain starts at `gain` and
    /// stays clamped to `0.0..=0.3`.
    pub fn line_follow(
        &mut self,
        port: Port,
        degrees: u32,
        speed: i32,
        gain: f32,
        side: LineSide,
    ) -> Result<LineFollowStats, DriveError> {
        debug!(?port, degrees, speed, ?side, "adaptive line follow");
        let base = speed as f32 * self.config.speed_scale;
        let mut adaptive = gain;
        let mut samples = 0u32;
        let mut error_sum = 0.0f32;
        let started = self.hub.ticks_ms();
        self.reset_origin()?;
        while self.distance_traveled()? < degrees {
            if self.abort_pending() {
                self.abort_drive()?;
            }
            let light = self.hub.light(port)? as f32;
            if fabsf(LIGHT_TARGET - light) > LIGHT_BAND {
                adaptive += GAIN_GROWTH * base;
            } else {
                adaptive -= GAIN_DECAY * base;
            }
            adaptive = adaptive.clamp(0.0, GAIN_CEILING);
            let dark_term = (light - DARK_PIVOT) * adaptive + base;
            let bright_term = (BRIGHT_PIVOT - light) * adaptive + base;
            match side {
                LineSide::Left => self.drive_at_speed(dark_term, bright_term)?,
                LineSide::Right => self.drive_at_speed(bright_term, dark_term)?,
            }
            error_sum += light - LIGHT_TARGET;
            samples += 1;
        }
        self.brake()?;
        let stats = self.finish_stats(started, samples, error_sum);
        info!(
            samples = stats.samples,
            rate_hz = stats.sample_rate_hz as f64,
            "line follow done"
        );
        Ok(stats)
    }

    /// Follows a line edge with a fixed steering gain.
    ///
    /// A reading brighter than `target` speeds up the left wheel and slows
    /// the right, bearing the chassis right.
    pub fn line_follow_fixed(
        &mut self,
        port: Port,
        degrees: u32,
        speed: i32,
        gain: f32,
        target: u8,
    ) -> Result<LineFollowStats, DriveError> {
        debug!(?port, degrees, speed, target, "fixed line follow");
        let base = speed as f32 * self.config.speed_scale;
        let mut samples = 0u32;
        let mut error_sum = 0.0f32;
        let started = self.hub.ticks_ms();
        self.reset_origin()?;
        while self.distance_traveled()? < degrees {
            if self.abort_pending() {
                self.abort_drive()?;
            }
            let error = self.hub.light(port)? as f32 - target as f32;
            self.drive_at_speed(base + error * gain, base - error * gain)?;
            error_sum += error;
            samples += 1;
        }
        self.brake()?;
        Ok(self.finish_stats(started, samples, error_sum))
    }

    /// Follows the opposite line edge with a fixed steering gain.
    ///
    /// Steers with the opposite sign convention to
    /// [`line_follow_fixed`](Robot::line_follow_fixed): a reading brighter
    /// than `target` bears the chassis left.
    pub fn line_follow_fixed_mirrored(
        &mut self,
        port: Port,
        degrees: u32,
        speed: i32,
        gain: f32,
        target: u8,
    ) -> Result<LineFollowStats, DriveError> {
        debug!(?port, degrees, speed, target, "mirrored fixed line follow");
        let base = speed as f32 * self.config.speed_scale;
        let mut samples = 0u32;
        let mut error_sum = 0.0f32;
        let started = self.hub.ticks_ms();
        self.reset_origin()?;
        while self.distance_traveled()? < degrees {
            if self.abort_pending() {
                self.abort_drive()?;
            }
            let error = self.hub.light(port)? as f32 - target as f32;
            self.drive_at_speed(base - error * gain, base + error * gain)?;
            error_sum += error;
            samples += 1;
        }
        self.brake()?;
        Ok(self.finish_stats(started, samples, error_sum))
    }

    fn finish_stats(
        &mut self,
        started_ms: u64,
        samples: u32,
        error_sum: f32,
    ) -> LineFollowStats {
        let elapsed_ms = self.hub.ticks_ms().saturating_sub(started_ms).max(1);
        LineFollowStats {
            samples,
            sample_rate_hz: samples as f32 * 1000.0 / elapsed_ms as f32,
            mean_error: if samples == 0 { 0.0 } else { error_sum / samples as f32 },
        }
    }
}
