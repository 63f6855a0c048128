// Loop rate, topics, geometry and gait tuning constants

// Runtime loop frequency while idle (waiting for commands)
pub const LOOP_HZ: u64 = 50;

// Zenoh topics
pub const TOPIC_CMD_GAIT: &str = "hexapod/cmd/gait"; // command words
pub const TOPIC_RT_JOINTS: &str = "hexapod/rt/joints"; // emitted joint angles
pub const TOPIC_HEALTH: &str = "hexapod/state/health"; // health status

// Serial port for the Maestro servo controller
pub const MAESTRO_PORT: &str = "/dev/ttyO1";

// Chassis dimensions in millimeters. The body is a regular hexagon of side
// BODY_SIDE_MM with one leg at each corner.
pub const BODY_SIDE_MM: f32 = 45.0;
pub const COXA_MM: f32 = 35.0;
pub const FEMUR_MM: f32 = 50.0;
pub const TIBIA_MM: f32 = 95.0;

// Gait defaults and safe ranges. Adjustment commands scale by PARAM_SCALE
// per press and clamp to the range so repeated presses cannot overextend
// the mechanics.
pub const PARAM_SCALE: f32 = 1.2;

pub const STEP_DELAY_MS: f32 = 150.0;
pub const STEP_DELAY_RANGE_MS: (f32, f32) = (25.0, 1000.0);

pub const STRIDE_DEG: f32 = 12.0;
pub const STRIDE_RANGE_DEG: (f32, f32) = (2.0, 25.0);

// Hard bound on any leg's coxa swing offset from neutral. Walks preempted
// at a half-step boundary inherit the interrupted step's offsets, so the
// per-press stride clamp alone does not bound the commanded coxa angle.
pub const SWING_LIMIT_DEG: f32 = 30.0;

pub const LIFT_MM: f32 = 30.0;
pub const LIFT_RANGE_MM: (f32, f32) = (5.0, 60.0);

// Folded parking posture: femur raised, knee tucked under the body
pub const PARK_FEMUR_DEG: f32 = 60.0;
pub const PARK_TIBIA_DEG: f32 = -140.0;
