// Body-level IK: one body pose plus six foot targets in, six joint-angle
// triples out. Legs are geometrically decoupled so this is a plain per-leg
// loop; the first unreachable leg fails the whole solve, and the caller
// never emits a partial command.

use super::geometry::{FootTarget, HexGeometry, LEG_COUNT};
use super::leg::{self, BodyPose, IkError, JointAngles};

/// Solve all six legs for one body pose. Strict: any unreachable foot
/// target fails the whole solve.
pub fn solve_body(
    geom: &HexGeometry,
    pose: &BodyPose,
    feet: &[FootTarget; LEG_COUNT],
) -> Result<[JointAngles; LEG_COUNT], IkError> {
    let mut angles = [JointAngles::default(); LEG_COUNT];
    for (leg, foot) in feet.iter().enumerate() {
        angles[leg] = leg::solve_leg(geom.leg(leg), &geom.links, pose, *foot)?;
    }
    Ok(angles)
}

/// Like [`solve_body`], but clamps each compensated target to the leg's
/// reachable annulus first. Used for stance reposturing, where a slightly
/// out-of-range pose should bend the stance rather than fail.
pub fn solve_body_clamped(
    geom: &HexGeometry,
    pose: &BodyPose,
    feet: &[FootTarget; LEG_COUNT],
) -> Result<[JointAngles; LEG_COUNT], IkError> {
    let mut angles = [JointAngles::default(); LEG_COUNT];
    for (leg, foot) in feet.iter().enumerate() {
        let compensated = leg::clamp_to_reach(
            geom.leg(leg),
            &geom.links,
            leg::body_compensate(geom.leg(leg), pose, *foot),
        );
        angles[leg] = leg::solve_leg_local(geom.leg(leg), &geom.links, compensated)?;
    }
    Ok(angles)
}

/// Neutral foot targets for all six legs
pub fn neutral_feet(geom: &HexGeometry) -> [FootTarget; LEG_COUNT] {
    std::array::from_fn(|leg| geom.neutral_foot(leg))
}
