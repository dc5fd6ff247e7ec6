//! Clinical joint angles.
//!
//! Each joint couples two adjacent segment frames: the distal segment is
//! expressed in the proximal frame, decomposed with the intrinsic XYZ
//! sequence (x mediolateral, y anterior, z longitudinal in neutral), and
//! mapped onto clinical flexion/abduction/rotation by a per-joint,
//! per-side sign table.

use crate::error::Result;
use crate::geometry::{self, EulerSequence};
use crate::types::{AngleSeries, Side, TransformSeries, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Joint {
    Hip,
    Knee,
    Ankle,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::Hip, Joint::Knee, Joint::Ankle];

    pub fn label(self) -> &'static str {
        match self {
            Joint::Hip => "Hip",
            Joint::Knee => "Knee",
            Joint::Ankle => "Ankle",
        }
    }
}

/// Fixed clinical sign table: multipliers for the raw intrinsic-XYZ
/// angles (flexion, abduction, rotation), fully enumerated per joint and
/// side.
///
/// Because every segment frame keeps its x axis toward the subject's
/// right, raw flexion reads the same physical direction on both sides,
/// while raw abduction and rotation mirror; the left column therefore
/// flips axes 2 and 3 for every joint. The knee's first entry is flipped
/// on both sides: clinical knee flexion (heel toward the pelvis) is the
/// opposite x rotation from hip and ankle flexion.
pub fn sign_table(joint: Joint, side: Side) -> [f64; 3] {
    match (joint, side) {
        (Joint::Hip, Side::Right) => [1.0, 1.0, 1.0],
        (Joint::Hip, Side::Left) => [1.0, -1.0, -1.0],
        (Joint::Knee, Side::Right) => [-1.0, 1.0, 1.0],
        (Joint::Knee, Side::Left) => [-1.0, -1.0, -1.0],
        (Joint::Ankle, Side::Right) => [1.0, 1.0, 1.0],
        (Joint::Ankle, Side::Left) => [1.0, -1.0, -1.0],
    }
}

/// Named flexion/abduction/rotation series for one joint [degrees].
#[derive(Clone, Debug)]
pub struct JointAngleSeries {
    pub name: String,
    pub joint: Joint,
    pub side: Side,
    pub angles: AngleSeries,
}

impl JointAngleSeries {
    fn component(&self, idx: usize) -> Vec<Option<f64>> {
        self.angles.iter().map(|a| a.map(|a| a[idx])).collect()
    }

    pub fn flexion(&self) -> Vec<Option<f64>> {
        self.component(0)
    }

    pub fn abduction(&self) -> Vec<Option<f64>> {
        self.component(1)
    }

    pub fn rotation(&self) -> Vec<Option<f64>> {
        self.component(2)
    }
}

/// Joint angle series for one joint and side: relative transform per
/// sample, XYZ decomposition in degrees, then the clinical sign table.
pub fn joint_angles(
    proximal: &TransformSeries,
    distal: &TransformSeries,
    joint: Joint,
    side: Side,
) -> Result<JointAngleSeries> {
    let local = geometry::local_coordinates(distal, proximal)?;
    let signs = sign_table(joint, side);
    let angles = local
        .iter()
        .map(|t| {
            t.as_ref().map(|t| {
                let raw =
                    geometry::euler_angles(&t.rotation.to_rotation_matrix(), EulerSequence::XYZ);
                Vec3::new(raw.x * signs[0], raw.y * signs[1], raw.z * signs[2])
            })
        })
        .collect();
    Ok(JointAngleSeries {
        name: side.marker(joint.label()),
        joint,
        side,
        angles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compose_euler;
    use crate::types::{Point, Transform};
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn pose_from_euler(angles_deg: Vec3) -> Transform {
        let rot = compose_euler(&angles_deg, EulerSequence::XYZ);
        Transform::from_parts(
            Translation3::from(Point::new(0.0, 0.0, 1.0).coords),
            UnitQuaternion::from_rotation_matrix(&rot),
        )
    }

    #[test]
    fn test_sign_table_fully_enumerated() {
        for joint in Joint::ALL {
            for side in Side::BOTH {
                let signs = sign_table(joint, side);
                assert!(signs.iter().all(|s| s.abs() == 1.0));
                // left flips abduction and rotation relative to right
                let right = sign_table(joint, Side::Right);
                let left = sign_table(joint, Side::Left);
                assert_relative_eq!(left[1], -right[1]);
                assert_relative_eq!(left[2], -right[2]);
                assert_relative_eq!(left[0], right[0]);
            }
        }
        // knee flexion is the flipped x rotation
        assert_relative_eq!(sign_table(Joint::Knee, Side::Right)[0], -1.0);
        assert_relative_eq!(sign_table(Joint::Hip, Side::Right)[0], 1.0);
    }

    #[test]
    fn test_pure_flexion_reads_on_first_axis() {
        let proximal = vec![Some(Transform::identity())];
        let distal = vec![Some(pose_from_euler(Vec3::new(30.0, 0.0, 0.0)))];
        let hip = joint_angles(&proximal, &distal, Joint::Hip, Side::Right).unwrap();
        let a = hip.angles[0].unwrap();
        assert_relative_eq!(a, Vec3::new(30.0, 0.0, 0.0), epsilon = 1e-9);
        assert_eq!(hip.name, "RHip");
    }

    #[test]
    fn test_left_side_flips_abduction_and_rotation() {
        let proximal = vec![Some(Transform::identity())];
        let distal = vec![Some(pose_from_euler(Vec3::new(10.0, 5.0, -8.0)))];
        let right = joint_angles(&proximal, &distal, Joint::Hip, Side::Right).unwrap();
        let left = joint_angles(&proximal, &distal, Joint::Hip, Side::Left).unwrap();
        let r = right.angles[0].unwrap();
        let l = left.angles[0].unwrap();
        assert_relative_eq!(l.x, r.x, epsilon = 1e-12);
        assert_relative_eq!(l.y, -r.y, epsilon = 1e-12);
        assert_relative_eq!(l.z, -r.z, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_samples_propagate_with_length() {
        let proximal = vec![Some(Transform::identity()), None, Some(Transform::identity())];
        let distal = vec![Some(Transform::identity()); 3];
        let knee = joint_angles(&proximal, &distal, Joint::Knee, Side::Left).unwrap();
        assert_eq!(knee.angles.len(), 3);
        assert!(knee.angles[0].is_some());
        assert!(knee.angles[1].is_none());
        assert!(knee.angles[2].is_some());
    }

    #[test]
    fn test_component_accessors() {
        let proximal = vec![Some(Transform::identity())];
        let distal = vec![Some(pose_from_euler(Vec3::new(12.0, 3.0, 4.0)))];
        let ankle = joint_angles(&proximal, &distal, Joint::Ankle, Side::Right).unwrap();
        assert_relative_eq!(ankle.flexion()[0].unwrap(), 12.0, epsilon = 1e-9);
        assert_relative_eq!(ankle.abduction()[0].unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(ankle.rotation()[0].unwrap(), 4.0, epsilon = 1e-9);
    }
}
