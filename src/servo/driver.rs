// Calibrated servo driver for the hexapod
//
// Maps joint angles in degrees onto Maestro pulse targets using the
// per-servo calibration table (channel wiring, home pulse, rotation
// direction). This is the actuation boundary: everything above it works
// in degrees, everything below in quarter-microseconds.

use tracing::{debug, info, warn};

use super::maestro::{MaestroBus, MaestroError};
use crate::kinematics::{JointAngles, LEG_COUNT};

pub const SERVO_COUNT: usize = 18;

/// Quarter-microseconds of pulse per degree of joint travel
/// (90 degrees = 3000 qus on these servos)
pub const QUS_PER_DEG: f32 = 3000.0 / 90.0;

/// Pulse band the horns can reach without binding
const TARGET_MIN_QUS: f32 = 2000.0;
const TARGET_MAX_QUS: f32 = 10000.0;

/// Calibration for one physical servo: Maestro channel, home pulse
/// (joint angle 0) and rotation direction.
#[derive(Debug, Clone, Copy)]
pub struct ServoCalib {
    pub channel: u8,
    pub home_qus: u16,
    pub dir: i8,
}

const fn cal(channel: u8, home_qus: u16, dir: i8) -> ServoCalib {
    ServoCalib {
        channel,
        home_qus,
        dir,
    }
}

/// Calibration table, indexed `leg * 3 + joint` with joints ordered
/// (coxa, femur, tibia). Channels follow the harness as wired; note leg
/// 1's femur/tibia channels are swapped (5 then 4) on the real robot.
pub const SERVO_CALIB: [ServoCalib; SERVO_COUNT] = [
    // leg 0
    cal(0, 7500, -1),
    cal(1, 6900, -1),
    cal(2, 9000, 1),
    // leg 1
    cal(3, 4500, 1),
    cal(5, 5100, 1),
    cal(4, 3000, -1),
    // leg 2
    cal(6, 7500, -1),
    cal(7, 6900, -1),
    cal(8, 9000, 1),
    // leg 3
    cal(9, 4500, 1),
    cal(10, 5100, 1),
    cal(11, 3000, -1),
    // leg 4
    cal(12, 7500, -1),
    cal(13, 6900, -1),
    cal(14, 9000, 1),
    // leg 5
    cal(15, 4500, 1),
    cal(16, 5100, 1),
    cal(17, 3000, -1),
];

/// Convert a joint angle to a clamped pulse target for one servo
pub fn angle_to_target(calib: &ServoCalib, angle_deg: f32) -> u16 {
    let raw = f32::from(calib.home_qus) + angle_deg * QUS_PER_DEG * f32::from(calib.dir);
    raw.round().clamp(TARGET_MIN_QUS, TARGET_MAX_QUS) as u16
}

/// High-level driver for the eighteen leg servos
pub struct ServoDriver {
    bus: MaestroBus,
    calib: [ServoCalib; SERVO_COUNT],
}

impl ServoDriver {
    /// Open the Maestro on the given serial port with the robot's
    /// calibration table
    pub fn new(port: &str) -> Result<Self, MaestroError> {
        Self::with_calibration(port, SERVO_CALIB)
    }

    pub fn with_calibration(
        port: &str,
        calib: [ServoCalib; SERVO_COUNT],
    ) -> Result<Self, MaestroError> {
        info!("Opening Maestro on {}", port);
        let bus = MaestroBus::open(port)?;
        Ok(Self { bus, calib })
    }

    /// Clear any startup error state and apply a conservative speed limit
    /// so the first commanded frame cannot snap the legs.
    pub fn initialize(&mut self) -> Result<(), MaestroError> {
        let startup_errors = self.bus.get_errors()?;
        if startup_errors != 0 {
            warn!("Maestro startup errors cleared: 0x{:04X}", startup_errors);
        }
        for servo in &self.calib {
            self.bus.set_speed(servo.channel, 60)?;
            self.bus.set_acceleration(servo.channel, 0)?;
        }
        info!("Servo driver initialized ({} channels)", SERVO_COUNT);
        Ok(())
    }

    /// Command a whole frame of joint angles, then check the controller's
    /// error register so a rejected command surfaces as a fault instead of
    /// a silently wrong stance.
    pub fn set_leg_angles(
        &mut self,
        angles: &[JointAngles; LEG_COUNT],
    ) -> Result<(), MaestroError> {
        for (leg, a) in angles.iter().enumerate() {
            for (joint, angle) in a.as_array().into_iter().enumerate() {
                let calib = &self.calib[leg * 3 + joint];
                let target = angle_to_target(calib, angle);
                debug!(
                    "leg {} joint {}: {:.1}deg -> {}qus on channel {}",
                    leg, joint, angle, target, calib.channel
                );
                self.bus.set_target(calib.channel, target)?;
            }
        }
        self.bus.check_errors()
    }

    /// Send every channel to its calibrated home (neutral stance)
    pub fn go_home(&mut self) -> Result<(), MaestroError> {
        info!("Sending all servos home");
        self.bus.go_home()
    }
}

impl Drop for ServoDriver {
    fn drop(&mut self) {
        // Leave the robot in its neutral stance rather than wherever the
        // last frame put it
        if let Err(e) = self.bus.go_home() {
            warn!("Failed to home servos on drop: {}", e);
        }
    }
}
