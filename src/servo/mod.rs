// Servo actuation for the hexapod
//
// Provides:
// - Pololu Maestro compact serial protocol
// - Calibrated joint-angle to pulse-target driver for the 18 leg servos

pub mod driver;
pub mod maestro;

pub use driver::{SERVO_CALIB, SERVO_COUNT, ServoCalib, ServoDriver, angle_to_target};
pub use maestro::{MaestroBus, MaestroError};
