// Hexapod walking-robot runtime
//
// - kinematics: chassis geometry, per-leg IK, body-level solve
// - gait: tripod gait sequencer (the frame source)
// - servo: Maestro serial protocol and calibrated angle driver
// - runtime: zenoh command intake wired to the gait and the servos

pub mod config;
pub mod gait;
pub mod kinematics;
pub mod messages;
pub mod runtime;
pub mod servo;
