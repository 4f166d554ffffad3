//! Simulated hub for host-side tests and demos.
//!
//! [`MockHub`] models a differential-drive chassis with mirrored drive
//! motors, an attachment motor rig, a drifting gyro and configurable light
//! sensors. Simulated time only advances when the code under test interacts
//! with the hub: one fixed tick per sensor sample, and the requested amount
//! per [`Hub::sleep_ms`]. Runs are therefore deterministic regardless of
//! host load.
//!
//! The geometry constant is tuned so that a discrete rotation of 2560
//! encoder degrees per side turns the chassis through one full revolution,
//! matching the drive base the gyro calibration sweep was written for.

use libm::{fabsf, roundf};

use super::{Hub, HubError, MotorCommand, MotorPair, MoveSignal, Port, PORT_COUNT};

/// Simulated time consumed by one sensor sample.
const TICK_MS: u64 = 5;

/// Degrees per second of motor shaft rotation per percent of speed.
const SPEED_DEG_PER_S: f32 = 10.0;

/// Chassis yaw degrees per degree of wheel-speed differential.
const YAW_PER_WHEEL_DEG: f32 = 0.070_312_5;

#[derive(Clone, Copy)]
enum LightSource {
    /// Constant reading.
    Value(u8),
    /// Reading as a function of drive distance, for simulating line edges.
    Profile(fn(f32) -> u8),
}

#[derive(Clone, Copy)]
enum PairMode {
    Idle,
    Speed(MotorCommand),
    Move {
        left_remaining: f32,
        right_remaining: f32,
        command: MotorCommand,
    },
}

struct PairState {
    left_deg: f32,
    right_deg: f32,
    mode: PairMode,
    armed: Option<&'static MoveSignal>,
    held: bool,
    last_command: Option<MotorCommand>,
    speed_commands: u32,
}

impl PairState {
    fn new() -> Self {
        Self {
            left_deg: 0.0,
            right_deg: 0.0,
            mode: PairMode::Idle,
            armed: None,
            held: false,
            last_command: None,
            speed_commands: 0,
        }
    }
}

#[derive(Clone, Copy)]
enum MotorMode {
    Idle,
    Speed(i32),
    Move { remaining: f32, speed: i32 },
}

#[derive(Clone, Copy)]
struct MotorState {
    deg: f32,
    mode: MotorMode,
    held: bool,
}

impl MotorState {
    fn new() -> Self {
        Self { deg: 0.0, mode: MotorMode::Idle, held: false }
    }
}

/// Deterministic software model of a robot hub.
pub struct MockHub {
    clock_ms: u64,
    drive: PairState,
    attachment: PairState,
    motors: [MotorState; PORT_COUNT],
    lights: [Option<LightSource>; PORT_COUNT],
    light_fault: Option<(Port, u32)>,
    yaw_deg: f32,
    yaw_drift_dps: f32,
    yaw_trim: f32,
    last_yaw_reset: Option<(i32, f32)>,
}

impl MockHub {
    pub fn new() -> Self {
        Self {
            clock_ms: 0,
            drive: PairState::new(),
            attachment: PairState::new(),
            motors: [MotorState::new(); PORT_COUNT],
            lights: [None; PORT_COUNT],
            light_fault: None,
            yaw_deg: 0.0,
            yaw_drift_dps: 0.0,
            yaw_trim: 0.0,
            last_yaw_reset: None,
        }
    }

    /// Attaches a light sensor reporting a constant value.
    pub fn set_light(
        &mut self,
        port: Port,
        value: u8,
    ) {
        self.lights[port.index()] = Some(LightSource::Value(value));
    }

    /// Attaches a light sensor whose reading follows drive distance.
    pub fn set_light_profile(
        &mut self,
        port: Port,
        profile: fn(f32) -> u8,
    ) {
        self.lights[port.index()] = Some(LightSource::Profile(profile));
    }

    /// Makes the light sensor on `port` start reporting a device fault
    /// after the given number of good reads.
    pub fn fail_light_after(
        &mut self,
        port: Port,
        good_reads: u32,
    ) {
        self.light_fault = Some((port, good_reads));
    }

    /// Sets the uncorrected gyro drift, in degrees per second.
    pub fn set_yaw_drift(
        &mut self,
        degrees_per_second: f32,
    ) {
        self.yaw_drift_dps = degrees_per_second;
    }

    /// Yaw as the gyro would report it, without consuming simulated time.
    pub fn yaw_degrees(&self) -> f32 {
        wrap_deg(self.yaw_deg)
    }

    /// Arguments of the most recent yaw reset.
    pub fn last_yaw_reset(&self) -> Option<(i32, f32)> {
        self.last_yaw_reset
    }

    pub fn now_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn drive_held(&self) -> bool {
        self.drive.held
    }

    pub fn attachment_held(&self) -> bool {
        self.attachment.held
    }

    /// Most recent speed or move command sent to the drive pair.
    pub fn last_drive_command(&self) -> Option<MotorCommand> {
        self.drive.last_command
    }

    /// Number of continuous speed commands the drive pair has received.
    pub fn drive_speed_commands(&self) -> u32 {
        self.drive.speed_commands
    }

    /// Shaft position of a single motor, in degrees.
    pub fn motor_degrees(
        &self,
        port: Port,
    ) -> f32 {
        self.motors[port.index()].deg
    }

    pub fn motor_held(
        &self,
        port: Port,
    ) -> bool {
        self.motors[port.index()].held
    }

    fn pair_mut(
        &mut self,
        pair: MotorPair,
    ) -> &mut PairState {
        match pair {
            MotorPair::Drive => &mut self.drive,
            MotorPair::Attachment => &mut self.attachment,
        }
    }

    fn drive_distance(&self) -> f32 {
        (fabsf(self.drive.left_deg) + fabsf(self.drive.right_deg)) / 2.0
    }

    /// Runs the simulation forward by `ms` milliseconds.
    fn advance(
        &mut self,
        ms: u64,
    ) {
        let dt = ms as f32 / 1000.0;
        self.clock_ms += ms;

        let (dl, dr) = Self::step_pair(&mut self.drive, dt);
        // Left drive motor is mounted mirrored, so its positive shaft
        // direction moves the chassis backward.
        self.yaw_deg += YAW_PER_WHEEL_DEG * (-dl - dr);
        self.yaw_deg += self.yaw_drift_dps * (1.0 - self.yaw_trim) * dt;

        Self::step_pair(&mut self.attachment, dt);
        for motor in &mut self.motors {
            Self::step_motor(motor, dt);
        }
    }

    fn step_pair(
        pair: &mut PairState,
        dt: f32,
    ) -> (f32, f32) {
        match pair.mode {
            PairMode::Idle => (0.0, 0.0),
            PairMode::Speed(command) => {
                let dl = command.left as f32 * SPEED_DEG_PER_S * dt;
                let dr = command.right as f32 * SPEED_DEG_PER_S * dt;
                pair.left_deg += dl;
                pair.right_deg += dr;
                (dl, dr)
            }
            PairMode::Move { mut left_remaining, mut right_remaining, command } => {
                let dl = Self::step_toward(&mut left_remaining, command.left, dt);
                let dr = Self::step_toward(&mut right_remaining, command.right, dt);
                pair.left_deg += dl;
                pair.right_deg += dr;
                if left_remaining <= 0.0 && right_remaining <= 0.0 {
                    pair.mode = PairMode::Idle;
                    pair.held = true;
                    if let Some(done) = pair.armed.take() {
                        done.signal(());
                    }
                } else {
                    pair.mode = PairMode::Move { left_remaining, right_remaining, command };
                }
                (dl, dr)
            }
        }
    }

    fn step_motor(
        motor: &mut MotorState,
        dt: f32,
    ) {
        match motor.mode {
            MotorMode::Idle => {}
            MotorMode::Speed(speed) => {
                motor.deg += speed as f32 * SPEED_DEG_PER_S * dt;
            }
            MotorMode::Move { mut remaining, speed } => {
                motor.deg += Self::step_toward(&mut remaining, speed, dt);
                if remaining <= 0.0 {
                    motor.mode = MotorMode::Idle;
                    motor.held = true;
                } else {
                    motor.mode = MotorMode::Move { remaining, speed };
                }
            }
        }
    }

    /// Advances one motor of a discrete move, consuming at most `remaining`
    /// degrees, and returns the signed shaft delta.
    fn step_toward(
        remaining: &mut f32,
        speed: i32,
        dt: f32,
    ) -> f32 {
        if *remaining <= 0.0 {
            return 0.0;
        }
        let step = (speed.unsigned_abs() as f32 * SPEED_DEG_PER_S * dt).min(*remaining);
        *remaining -= step;
        if speed < 0 { -step } else { step }
    }
}

impl Default for MockHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub for MockHub {
    fn set_speeds(
        &mut self,
        pair: MotorPair,
        command: MotorCommand,
    ) -> Result<(), HubError> {
        let command = clamp_command(command);
        let state = self.pair_mut(pair);
        state.mode = PairMode::Speed(command);
        state.held = false;
        state.last_command = Some(command);
        state.speed_commands += 1;
        Ok(())
    }

    fn run_for_degrees(
        &mut self,
        pair: MotorPair,
        degrees: u32,
        command: MotorCommand,
    ) -> Result<(), HubError> {
        let command = clamp_command(command);
        let state = self.pair_mut(pair);
        // A motor commanded at zero speed contributes nothing to the move.
        state.mode = PairMode::Move {
            left_remaining: if command.left == 0 { 0.0 } else { degrees as f32 },
            right_remaining: if command.right == 0 { 0.0 } else { degrees as f32 },
            command,
        };
        state.held = false;
        state.last_command = Some(command);
        Ok(())
    }

    fn hold(
        &mut self,
        pair: MotorPair,
    ) -> Result<(), HubError> {
        let state = self.pair_mut(pair);
        state.mode = PairMode::Idle;
        state.held = true;
        Ok(())
    }

    fn reset_position(
        &mut self,
        pair: MotorPair,
        left: i32,
        right: i32,
    ) -> Result<(), HubError> {
        let state = self.pair_mut(pair);
        state.left_deg = left as f32;
        state.right_deg = right as f32;
        Ok(())
    }

    fn position(
        &mut self,
        pair: MotorPair,
    ) -> Result<(i32, i32), HubError> {
        self.advance(TICK_MS);
        let state = match pair {
            MotorPair::Drive => &self.drive,
            MotorPair::Attachment => &self.attachment,
        };
        Ok((roundf(state.left_deg) as i32, roundf(state.right_deg) as i32))
    }

    fn on_move_complete(
        &mut self,
        pair: MotorPair,
        done: &'static MoveSignal,
    ) -> Result<(), HubError> {
        self.pair_mut(pair).armed = Some(done);
        Ok(())
    }

    fn motor_run_at_speed(
        &mut self,
        port: Port,
        speed: i32,
    ) -> Result<(), HubError> {
        let motor = &mut self.motors[port.index()];
        motor.mode = MotorMode::Speed(speed.clamp(-100, 100));
        motor.held = false;
        Ok(())
    }

    fn motor_run_for_degrees(
        &mut self,
        port: Port,
        degrees: u32,
        speed: i32,
    ) -> Result<(), HubError> {
        let speed = speed.clamp(-100, 100);
        let motor = &mut self.motors[port.index()];
        motor.mode = MotorMode::Move {
            remaining: if speed == 0 { 0.0 } else { degrees as f32 },
            speed,
        };
        motor.held = false;
        Ok(())
    }

    fn motor_hold(
        &mut self,
        port: Port,
    ) -> Result<(), HubError> {
        let motor = &mut self.motors[port.index()];
        motor.mode = MotorMode::Idle;
        motor.held = true;
        Ok(())
    }

    fn motor_busy(
        &mut self,
        port: Port,
    ) -> Result<bool, HubError> {
        self.advance(TICK_MS);
        Ok(matches!(self.motors[port.index()].mode, MotorMode::Move { .. }))
    }

    fn yaw(&mut self) -> Result<i32, HubError> {
        self.advance(TICK_MS);
        Ok(wrap_deg(self.yaw_deg) as i32)
    }

    fn reset_yaw(
        &mut self,
        angle: i32,
        correction: f32,
    ) -> Result<(), HubError> {
        self.yaw_deg = angle as f32;
        self.yaw_trim = correction;
        self.last_yaw_reset = Some((angle, correction));
        Ok(())
    }

    fn light(
        &mut self,
        port: Port,
    ) -> Result<u8, HubError> {
        self.advance(TICK_MS);
        if let Some((fault_port, good_reads)) = &mut self.light_fault {
            if *fault_port == port {
                if *good_reads == 0 {
                    return Err(HubError::DeviceFault(port));
                }
                *good_reads -= 1;
            }
        }
        match self.lights[port.index()] {
            None => Err(HubError::NoDevice(port)),
            Some(LightSource::Value(value)) => Ok(value),
            Some(LightSource::Profile(profile)) => Ok(profile(self.drive_distance())),
        }
    }

    fn sleep_ms(
        &mut self,
        ms: u32,
    ) {
        self.advance(ms as u64);
    }

    fn ticks_ms(&mut self) -> u64 {
        self.clock_ms
    }
}

fn clamp_command(command: MotorCommand) -> MotorCommand {
    MotorCommand::new(command.left.clamp(-100, 100), command.right.clamp(-100, 100))
}

/// Wraps a continuous angle into the gyro's `(-180, 180]` reporting range.
fn wrap_deg(angle: f32) -> f32 {
    let mut wrapped = angle % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped < -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use embassy_sync::signal::Signal;

    use super::*;

    #[test]
    fn clock_advances_on_sleep_and_samples_only() {
        let mut hub = MockHub::new();
        assert_eq!(hub.ticks_ms(), 0);
        hub.sleep_ms(10);
        assert_eq!(hub.ticks_ms(), 10);
        hub.position(MotorPair::Drive).unwrap();
        assert_eq!(hub.ticks_ms(), 10 + TICK_MS);
    }

    #[test]
    fn continuous_speed_integrates_position() {
        let mut hub = MockHub::new();
        hub.set_speeds(MotorPair::Drive, MotorCommand::new(-40, 40)).unwrap();
        hub.sleep_ms(1000);
        let (left, right) = hub.position(MotorPair::Drive).unwrap();
        assert!(left < -395 && left > -410);
        assert!(right > 395 && right < 410);
    }

    #[test]
    fn mirrored_straight_command_does_not_rotate() {
        let mut hub = MockHub::new();
        hub.set_speeds(MotorPair::Drive, MotorCommand::new(-40, 40)).unwrap();
        hub.sleep_ms(2000);
        assert_eq!(hub.yaw_degrees(), 0.0);
    }

    #[test]
    fn common_mode_command_rotates() {
        let mut hub = MockHub::new();
        hub.set_speeds(MotorPair::Drive, MotorCommand::new(-20, -20)).unwrap();
        hub.sleep_ms(500);
        assert!(hub.yaw_degrees() > 5.0);
    }

    #[test]
    fn full_rotation_sweep_returns_to_zero() {
        let mut hub = MockHub::new();
        hub.run_for_degrees(MotorPair::Drive, 2560, MotorCommand::new(26, 26)).unwrap();
        hub.sleep_ms(11_000);
        let (left, right) = hub.position(MotorPair::Drive).unwrap();
        assert_eq!((left, right), (2560, 2560));
        assert!(fabsf(hub.yaw_degrees()) < 0.001);
    }

    #[test]
    fn discrete_move_snaps_fires_signal_and_holds() {
        static DONE: MoveSignal = Signal::new();
        let mut hub = MockHub::new();
        hub.on_move_complete(MotorPair::Drive, &DONE).unwrap();
        hub.run_for_degrees(MotorPair::Drive, 100, MotorCommand::new(-50, 50)).unwrap();
        assert!(DONE.try_take().is_none());
        hub.sleep_ms(1000);
        assert!(DONE.try_take().is_some());
        assert!(hub.drive_held());
        assert_eq!(hub.position(MotorPair::Drive).unwrap(), (-100, 100));
    }

    #[test]
    fn zero_speed_side_does_not_stall_a_move() {
        let mut hub = MockHub::new();
        hub.run_for_degrees(MotorPair::Drive, 100, MotorCommand::new(0, 50)).unwrap();
        hub.sleep_ms(1000);
        assert!(hub.drive_held());
        assert_eq!(hub.position(MotorPair::Drive).unwrap(), (0, 100));
    }

    #[test]
    fn unconfigured_light_port_reports_no_device() {
        let mut hub = MockHub::new();
        assert_eq!(hub.light(Port::B), Err(HubError::NoDevice(Port::B)));
        hub.set_light(Port::B, 55);
        assert_eq!(hub.light(Port::B), Ok(55));
    }

    #[test]
    fn light_fault_fires_after_the_good_reads() {
        let mut hub = MockHub::new();
        hub.set_light(Port::E, 60);
        hub.fail_light_after(Port::E, 2);
        assert_eq!(hub.light(Port::E), Ok(60));
        assert_eq!(hub.light(Port::E), Ok(60));
        assert_eq!(hub.light(Port::E), Err(HubError::DeviceFault(Port::E)));
        // The fault is permanent once it fires.
        assert_eq!(hub.light(Port::E), Err(HubError::DeviceFault(Port::E)));
    }

    #[test]
    fn drift_accumulates_and_trim_scales_it() {
        let mut hub = MockHub::new();
        hub.set_yaw_drift(1.0);
        hub.sleep_ms(4000);
        assert_eq!(hub.yaw_degrees(), 4.0);
        hub.reset_yaw(0, 0.5).unwrap();
        hub.sleep_ms(4000);
        assert_eq!(hub.yaw_degrees(), 2.0);
    }
}
