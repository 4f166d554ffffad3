//! # Hub Hardware Boundary
//!
//! Everything the maneuver layer needs from a robot hub, collected behind the
//! [`Hub`] trait:
//!
//! - paired motor channels for the drive base and the attachment rig
//! - individually addressed motors on lettered ports
//! - the gyro yaw angle and reflected-light sensors
//! - a millisecond clock and blocking sleep
//!
//! Firmware provides one implementation per target; [`mock::MockHub`] is the
//! simulated implementation used for host-side tests and demos.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use serde::{Deserialize, Serialize};

pub mod mock;

pub use mock::MockHub;

/// Number of lettered device ports on the hub.
pub const PORT_COUNT: usize = 6;

/// Lettered device port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Port {
    pub fn index(self) -> usize {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
            Port::E => 4,
            Port::F => 5,
        }
    }
}

/// The two preconfigured motor pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorPair {
    /// Wheel motors of the drive base.
    Drive,
    /// Paired attachment motors.
    Attachment,
}

/// Signed percentage speeds for the two motors of a pair, in device units
/// (`-100..=100`, positive is the motor's own forward).
///
/// Any chassis-level sign conventions (such as mirrored drive motors) are
/// applied by the caller before a command reaches the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    pub left: i32,
    pub right: i32,
}

impl MotorCommand {
    pub const fn new(
        left: i32,
        right: i32,
    ) -> Self {
        Self { left, right }
    }
}

/// Errors reported by a hub implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// No device of the expected kind is attached to the port.
    NoDevice(Port),
    /// The device on the port rejected the command.
    DeviceFault(Port),
}

/// Completion signal for a discrete move, fired from the hub's motion event.
pub type MoveSignal = Signal<CriticalSectionRawMutex, ()>;

/// Signal block shared between the maneuver layer and its supervisor.
///
/// The embedder owns one of these in a `static` and hands the same reference
/// to [`crate::utils::control::Robot`] and to whatever task may need to stop
/// it. `new` is `const`, so construction in a `static` needs no runtime init.
pub struct HubSignals {
    drive_done: MoveSignal,
    attachment_done: MoveSignal,
    abort: AtomicBool,
}

impl HubSignals {
    pub const fn new() -> Self {
        Self {
            drive_done: Signal::new(),
            attachment_done: Signal::new(),
            abort: AtomicBool::new(false),
        }
    }

    /// Completion signal for discrete moves on `pair`.
    pub fn move_done(
        &self,
        pair: MotorPair,
    ) -> &MoveSignal {
        match pair {
            MotorPair::Drive => &self.drive_done,
            MotorPair::Attachment => &self.attachment_done,
        }
    }

    /// Asks the maneuver layer to stop at its next poll.
    ///
    /// The flag stays set until [`clear_abort`](Self::clear_abort) is called,
    /// so every maneuver started in between fails fast.
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    pub fn clear_abort(&self) {
        self.abort.store(false, Ordering::Release);
    }

    pub fn abort_requested(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }
}

impl Default for HubSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Interface between the maneuver layer and the robot hub.
///
/// Methods take `&mut self`: the maneuver layer is single-threaded and owns
/// the hub for the duration of a run. Implementations are expected to be
/// cheap per call, since drive loops poll sensors continuously.
pub trait Hub {
    /// Runs both motors of a pair at the given speeds until told otherwise.
    fn set_speeds(
        &mut self,
        pair: MotorPair,
        command: MotorCommand,
    ) -> Result<(), HubError>;

    /// Starts a discrete move of `degrees` on each motor of a pair, at the
    /// given speeds, then returns immediately. The hub brakes the pair when
    /// the move finishes.
    fn run_for_degrees(
        &mut self,
        pair: MotorPair,
        degrees: u32,
        command: MotorCommand,
    ) -> Result<(), HubError>;

    /// Actively brakes both motors of a pair and holds position.
    fn hold(
        &mut self,
        pair: MotorPair,
    ) -> Result<(), HubError>;

    /// Redefines the pair's encoder readings to `(left, right)`.
    fn reset_position(
        &mut self,
        pair: MotorPair,
        left: i32,
        right: i32,
    ) -> Result<(), HubError>;

    /// Current encoder readings of the pair, in degrees.
    fn position(
        &mut self,
        pair: MotorPair,
    ) -> Result<(i32, i32), HubError>;

    /// Arms `done` to fire once, when the pair's current or next discrete
    /// move completes.
    ///
    /// Callers arm the signal before dispatching the move, so a move that
    /// finishes before the first poll cannot be missed. Re-arming replaces
    /// the previous registration.
    fn on_move_complete(
        &mut self,
        pair: MotorPair,
        done: &'static MoveSignal,
    ) -> Result<(), HubError>;

    /// Runs the motor on `port` at a signed percentage speed.
    fn motor_run_at_speed(
        &mut self,
        port: Port,
        speed: i32,
    ) -> Result<(), HubError>;

    /// Starts a discrete move of `degrees` on the motor on `port` and
    /// returns immediately.
    fn motor_run_for_degrees(
        &mut self,
        port: Port,
        degrees: u32,
        speed: i32,
    ) -> Result<(), HubError>;

    /// Actively brakes the motor on `port` and holds position.
    fn motor_hold(
        &mut self,
        port: Port,
    ) -> Result<(), HubError>;

    /// Whether the motor on `port` is still executing a discrete move.
    fn motor_busy(
        &mut self,
        port: Port,
    ) -> Result<bool, HubError>;

    /// Gyro yaw in whole degrees, relative to the last yaw reset.
    fn yaw(&mut self) -> Result<i32, HubError>;

    /// Redefines the current yaw as `angle` and installs a drift-correction
    /// factor obtained from calibration.
    fn reset_yaw(
        &mut self,
        angle: i32,
        correction: f32,
    ) -> Result<(), HubError>;

    /// Reflected-light reading on `port`, as a percentage (`0..=100`).
    fn light(
        &mut self,
        port: Port,
    ) -> Result<u8, HubError>;

    /// Blocks for at least `ms` milliseconds.
    fn sleep_ms(
        &mut self,
        ms: u32,
    );

    /// Monotonic milliseconds since hub start.
    fn ticks_ms(&mut self) -> u64;
}
