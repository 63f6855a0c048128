// Hexapod kinematics
//
// Provides:
// - Static chassis geometry (mounting offsets, link lengths, neutral feet)
// - Per-leg inverse kinematics with a reachability guard
// - Body-level solve across all six legs

pub mod body;
pub mod geometry;
pub mod leg;

pub use body::{neutral_feet, solve_body, solve_body_clamped};
pub use geometry::{FootTarget, HexGeometry, LEG_COUNT, LegGeometry, LegLinks};
pub use leg::{BodyPose, IkError, JointAngles, clamp_to_reach, forward_leg, solve_leg};
