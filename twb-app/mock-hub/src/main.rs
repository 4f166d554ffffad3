use clap::Parser;
use rand_core::RngCore;
use serde::Deserialize;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use twb_core::utils::control::{Direction, DriveConfig, DriveError, LineSide, Robot};
use twb_core::utils::hub::{HubSignals, MockHub, Port};
use twb_core::utils::math::curve::SpeedCurve;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// JSON run configuration
    #[clap(long)]
    config: Option<String>,
    /// seed for the simulated sensor imperfections
    #[clap(long)]
    seed: Option<u64>,
    /// skip the gyro calibration sweep
    #[clap(long)]
    skip_calibration: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RunConfig {
    drive: DriveConfig,
    light_port: Port,
    yaw_drift_dps: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            drive: DriveConfig { speed_scale: 1.025 },
            light_port: Port::F,
            yaw_drift_dps: 0.4,
        }
    }
}

/// Small deterministic generator for the simulated imperfections.
struct SplitMix64(u64);

impl RngCore for SplitMix64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Light reading of a painted line edge weaving under the sensor.
fn wavy_edge(distance_deg: f32) -> u8 {
    let wave = (distance_deg / 150.0).sin();
    (70.0 + 12.0 * wave) as u8
}

fn load_config(path: &str) -> Result<RunConfig, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

fn run_missions(
    robot: &mut Robot<MockHub>,
    opts: &Opts,
    config: &RunConfig,
) -> Result<(), DriveError> {
    // Drop any abort left over from a previous supervisor.
    robot.signals().clear_abort();
    let ramp = robot.register_curve(SpeedCurve::Linear { slope: -0.5, intercept: 1.0 })?;

    if !opts.skip_calibration {
        info!("calibrating gyro");
        robot.calibrate_gyro()?;
    }

    info!("mission: approach run");
    robot.reset_origin()?;
    robot.drive_heading(1150, 65, 1.3, 0, Direction::Forward, Some(ramp))?;
    robot.turn_to_heading(45)?;
    robot.drive_by_degrees(400, 40, 40, None, true)?;

    info!("mission: attachment work");
    robot.reset_attachments()?;
    robot.move_attachment(Port::A, 350, -100, true)?;
    // The lift pair keeps moving while the chassis backs out.
    robot.move_attachment_pair(220, 40, 40, false)?;
    robot.drive_by_degrees(300, -35, -35, None, true)?;

    info!("mission: line run");
    robot.start_attachment(Port::C, 60)?;
    let stats = robot.line_follow(config.light_port, 900, 35, 0.12, LineSide::Left)?;
    info!(
        samples = stats.samples,
        rate_hz = stats.sample_rate_hz as f64,
        mean_error = stats.mean_error as f64,
        "line stats"
    );
    robot.line_follow_fixed(config.light_port, 350, 30, 0.4, 70)?;
    robot.hold_attachment(Port::C)?;

    info!("mission: return home");
    robot.turn_to_heading(-135)?;
    robot.drive_heading(1500, 80, 1.0, -135, Direction::Forward, Some(ramp))?;
    robot.brake()?;

    let distance = robot.distance_traveled()?;
    info!(distance, "run complete");
    Ok(())
}

static SIGNALS: HubSignals = HubSignals::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let config = match &opts.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                error!("failed to load {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => RunConfig::default(),
    };

    let seed = opts.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    });
    info!(seed, ?config, "simulated run starting");
    let mut rng = SplitMix64(seed);

    let mut hub = MockHub::new();
    // Actual drift varies run to run within a band around the configured
    // value.
    let drift = config.yaw_drift_dps * (0.5 + rng.next_u32() as f32 / u32::MAX as f32);
    hub.set_yaw_drift(drift);
    hub.set_light_profile(config.light_port, wavy_edge);

    let mut robot = Robot::new(hub, config.drive, &SIGNALS);
    if let Err(err) = run_missions(&mut robot, &opts, &config) {
        error!("run failed: {:?}", err);
        std::process::exit(1);
    }
}
