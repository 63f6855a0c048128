// Static chassis geometry for the hexapod
//
// The body is a regular hexagon; one leg hangs off each corner. Everything
// here is fixed at construction and shared read-only by the IK code.

use crate::config::{BODY_SIDE_MM, COXA_MM, FEMUR_MM, TIBIA_MM};

pub const LEG_COUNT: usize = 6;

/// Leg mounting bearings (degrees, counter-clockwise from +x), one per
/// hexagon corner. Legs 0..2 are the +x side, 3..5 the -x side.
pub const LEG_MOUNT_DEG: [f32; LEG_COUNT] = [60.0, 0.0, -60.0, -120.0, 180.0, 120.0];

/// Link lengths shared by all six legs, millimeters
#[derive(Debug, Clone, Copy)]
pub struct LegLinks {
    pub coxa: f32,
    pub femur: f32,
    pub tibia: f32,
}

/// Mounting data for one leg: corner offset from body center and the yaw
/// bias that makes coxa angle 0 mean "pointing straight out".
#[derive(Debug, Clone, Copy)]
pub struct LegGeometry {
    pub offset_x: f32,
    pub offset_y: f32,
    pub mount_deg: f32,
}

/// A foot position in the leg's local frame: x/y in the ground plane
/// relative to the coxa mount, z positive downward (z = tibia length when
/// the foot rests on the ground under a level body).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootTarget {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl FootTarget {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Whole-chassis geometry: link lengths plus the six mounting records
#[derive(Debug, Clone)]
pub struct HexGeometry {
    pub links: LegLinks,
    legs: [LegGeometry; LEG_COUNT],
}

impl HexGeometry {
    pub fn new(body_side: f32, links: LegLinks) -> Self {
        assert!(body_side > 0.0, "body side must be positive");
        assert!(
            links.coxa > 0.0 && links.femur > 0.0 && links.tibia > 0.0,
            "link lengths must be positive"
        );

        // Hexagon corners sit at radius body_side on the mounting bearing
        let legs = LEG_MOUNT_DEG.map(|mount_deg| {
            let mount_rad = mount_deg.to_radians();
            LegGeometry {
                offset_x: body_side * mount_rad.cos(),
                offset_y: body_side * mount_rad.sin(),
                mount_deg,
            }
        });

        Self { links, legs }
    }

    /// Geometry of the real robot, from the chassis constants
    pub fn standard() -> Self {
        Self::new(
            BODY_SIDE_MM,
            LegLinks {
                coxa: COXA_MM,
                femur: FEMUR_MM,
                tibia: TIBIA_MM,
            },
        )
    }

    /// Mounting record for one leg. An out-of-range index is a programming
    /// error and panics.
    pub fn leg(&self, leg: usize) -> &LegGeometry {
        &self.legs[leg]
    }

    /// Resting foot position for one leg: straight out on the mounting
    /// bearing at radius coxa + femur, foot on the ground.
    pub fn neutral_foot(&self, leg: usize) -> FootTarget {
        let mount_rad = self.legs[leg].mount_deg.to_radians();
        let radius = self.links.coxa + self.links.femur;
        FootTarget::new(radius * mount_rad.cos(), radius * mount_rad.sin(), self.links.tibia)
    }
}
