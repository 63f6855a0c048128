// Per-leg inverse kinematics
//
// Two-stage solve: first shift the foot target to compensate the commanded
// body pose, then solve the coxa bearing and the femur/tibia two-link
// triangle in the vertical plane. All angles are in degrees and rebiased so
// that 0/0/0 is the neutral stance for every leg regardless of where it is
// mounted on the hexagon.

use super::geometry::{FootTarget, LegGeometry, LegLinks};

/// Commanded body frame relative to the neutral standing frame.
/// Translation in millimeters (positive z raises the body), rotation in
/// degrees. Converted to radians once, inside the solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// One leg's joint angles, degrees. 0/0/0 is neutral stance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub coxa: f32,
    pub femur: f32,
    pub tibia: f32,
}

impl JointAngles {
    pub fn as_array(&self) -> [f32; 3] {
        [self.coxa, self.femur, self.tibia]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum IkError {
    #[error("foot target out of reach: {reach:.1}mm, leg workspace [{min:.1}, {max:.1}]mm")]
    UnreachableTarget { reach: f32, min: f32, max: f32 },
}

/// Margin kept inside the workspace boundary when clamping, millimeters
const CLAMP_MARGIN_MM: f32 = 0.5;

/// Stage 1: shift a leg-local foot target so the body appears to take the
/// commanded pose while the foot stays planted.
///
/// Yaw is an exact planar rotation about the body center. Roll and pitch
/// use the original controller's linear tangent correction, proportional
/// to the foot's offset from the body center. That is a small-angle
/// approximation (valid for a few degrees of tilt), kept deliberately:
/// a full rotation matrix would change the observable leg trajectories.
pub(crate) fn body_compensate(geom: &LegGeometry, pose: &BodyPose, foot: FootTarget) -> FootTarget {
    let total_x = foot.x + geom.offset_x + pose.x;
    let total_y = foot.y + geom.offset_y + pose.y;

    let dist = (total_x.powi(2) + total_y.powi(2)).sqrt();
    let bearing = total_y.atan2(total_x) + pose.yaw.to_radians();
    let yaw_dx = dist * bearing.cos() - total_x;
    let yaw_dy = dist * bearing.sin() - total_y;

    let tilt_dz =
        pose.roll.to_radians().tan() * total_y + pose.pitch.to_radians().tan() * total_x;

    FootTarget::new(
        foot.x + pose.x + yaw_dx,
        foot.y + pose.y + yaw_dy,
        foot.z + pose.z + tilt_dz,
    )
}

/// Solve one leg for a body pose and a leg-local foot target.
pub fn solve_leg(
    geom: &LegGeometry,
    links: &LegLinks,
    pose: &BodyPose,
    foot: FootTarget,
) -> Result<JointAngles, IkError> {
    solve_leg_local(geom, links, body_compensate(geom, pose, foot))
}

/// Stages 2 and 3: coxa bearing plus the two-link solve, on a target that
/// already includes any body-pose compensation.
pub fn solve_leg_local(
    geom: &LegGeometry,
    links: &LegLinks,
    foot: FootTarget,
) -> Result<JointAngles, IkError> {
    let horiz = (foot.x.powi(2) + foot.y.powi(2)).sqrt();
    let r = horiz - links.coxa;
    let h = foot.z;
    let reach = (r.powi(2) + h.powi(2)).sqrt();

    let min = (links.femur - links.tibia).abs();
    let max = links.femur + links.tibia;
    // A NaN reach fails is_finite and lands here too; the caller never
    // sees a malformed angle. A target on the coxa's vertical axis has no
    // defined bearing and is rejected even when its reach is in range.
    if !reach.is_finite() || reach > max || reach < min || reach < 1e-3 || horiz < 1e-3 {
        return Err(IkError::UnreachableTarget { reach, min, max });
    }

    let coxa = normalize_deg(foot.y.atan2(foot.x).to_degrees() - geom.mount_deg);

    // atan2 keeps a near-zero vertical offset finite where the original's
    // atan(r / z) would divide by zero
    let elevation = r.atan2(h);
    // law of cosines, knee-up branch only; clamp guards float rounding at
    // the workspace boundary
    let base = ((links.femur.powi(2) + reach.powi(2) - links.tibia.powi(2))
        / (2.0 * links.femur * reach))
        .clamp(-1.0, 1.0)
        .acos();
    let knee = ((links.femur.powi(2) + links.tibia.powi(2) - reach.powi(2))
        / (2.0 * links.femur * links.tibia))
        .clamp(-1.0, 1.0)
        .acos();

    Ok(JointAngles {
        coxa,
        femur: 90.0 - (elevation + base).to_degrees(),
        tibia: 90.0 - knee.to_degrees(),
    })
}

/// Matching forward kinematics: joint angles back to the leg-local foot
/// position. Inverse of [`solve_leg_local`] inside the workspace.
pub fn forward_leg(geom: &LegGeometry, links: &LegLinks, angles: &JointAngles) -> FootTarget {
    let knee = (90.0 - angles.tibia).to_radians();
    let reach = (links.femur.powi(2) + links.tibia.powi(2)
        - 2.0 * links.femur * links.tibia * knee.cos())
    .sqrt();
    let base = ((links.femur.powi(2) + reach.powi(2) - links.tibia.powi(2))
        / (2.0 * links.femur * reach))
        .clamp(-1.0, 1.0)
        .acos();
    let elevation = (90.0 - angles.femur).to_radians() - base;

    let r = reach * elevation.sin();
    let h = reach * elevation.cos();
    let horiz = r + links.coxa;
    let bearing = (angles.coxa + geom.mount_deg).to_radians();

    FootTarget::new(horiz * bearing.cos(), horiz * bearing.sin(), h)
}

/// Pull a foot target radially to the nearest point inside the leg's
/// reachable annulus (recoverable path for stance reposturing; gait frames
/// use the strict solver and abort instead).
pub fn clamp_to_reach(geom: &LegGeometry, links: &LegLinks, foot: FootTarget) -> FootTarget {
    let horiz = (foot.x.powi(2) + foot.y.powi(2)).sqrt();
    let r = horiz - links.coxa;
    let h = foot.z;
    let reach = (r.powi(2) + h.powi(2)).sqrt();

    let min = (links.femur - links.tibia).abs() + CLAMP_MARGIN_MM;
    let max = links.femur + links.tibia - CLAMP_MARGIN_MM;
    if reach < 1e-3 || horiz < 1e-3 || !reach.is_finite() {
        // Degenerate target with no usable bearing: fall back to the
        // mounting bearing at mid-workspace depth
        let mount = geom.mount_deg.to_radians();
        let horiz = links.coxa + (min + max) * 0.5;
        return FootTarget::new(horiz * mount.cos(), horiz * mount.sin(), 0.0);
    }
    if reach >= min && reach <= max {
        return foot;
    }

    let scale = reach.clamp(min, max) / reach;
    let new_horiz = links.coxa + r * scale;
    let bearing = foot.y.atan2(foot.x);
    FootTarget::new(
        new_horiz * bearing.cos(),
        new_horiz * bearing.sin(),
        h * scale,
    )
}

/// Wrap an angle to (-180, 180] degrees
fn normalize_deg(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}
