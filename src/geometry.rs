//! Geometry kernel: vector series, orthonormal frame construction, rigid
//! transform algebra and Euler decomposition.
//!
//! Everything here operates per time sample over equal-length series.
//! Frames are right-handed and orthonormal by construction (one direction
//! normalized, two cross products), never by post-hoc correction, so the
//! rotation part always has determinant +1.

use nalgebra::{Matrix3, Translation3, UnitQuaternion, UnitVector3, Vector3};

use crate::error::{GaitError, Result};
use crate::types::{Point, PointSeries, Rotation, Transform, TransformSeries, Vec3, VectorSeries};

/// Squared-length floor below which a direction is considered vanishing
/// and a cross product degenerate.
const DEGENERACY_TOL: f64 = 1e-10;

/// |sin| of the middle angle above which a Tait-Bryan decomposition is
/// treated as gimbal-locked.
const GIMBAL_LOCK_TOL: f64 = 1.0 - 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> UnitVector3<f64> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    fn from_char(c: char) -> Option<Axis> {
        match c.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    /// The axis that is neither `a` nor `b`. Caller guarantees `a != b`.
    fn remaining(a: Axis, b: Axis) -> Axis {
        [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .find(|&c| c != a && c != b)
            .unwrap_or(Axis::Z)
    }
}

/// True when `b` follows `a` in the cyclic order x -> y -> z -> x, i.e.
/// `a × b` points along the remaining positive axis.
fn cyclic(a: Axis, b: Axis) -> bool {
    (b.index() + 3 - a.index()) % 3 == 1
}

/// Intrinsic Tait-Bryan axis ordering, e.g. "XYZ" (rotate about x, then
/// the rotated y, then the rotated z).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EulerSequence(pub Axis, pub Axis, pub Axis);

impl EulerSequence {
    pub const XYZ: EulerSequence = EulerSequence(Axis::X, Axis::Y, Axis::Z);
    pub const ZYX: EulerSequence = EulerSequence(Axis::Z, Axis::Y, Axis::X);

    /// Parse a three-letter sequence of distinct axes.
    pub fn parse(s: &str) -> Result<EulerSequence> {
        let axes: Vec<Axis> = s.chars().filter_map(Axis::from_char).collect();
        if axes.len() != 3 || s.chars().count() != 3 {
            return Err(GaitError::UnsupportedSequence(s.to_string()));
        }
        let seq = EulerSequence(axes[0], axes[1], axes[2]);
        if seq.0 == seq.1 || seq.1 == seq.2 || seq.0 == seq.2 {
            return Err(GaitError::UnsupportedSequence(s.to_string()));
        }
        Ok(seq)
    }
}

/// Per-sample difference `b − a` of two point series.
pub fn vector(a: &PointSeries, b: &PointSeries) -> Result<VectorSeries> {
    if a.len() != b.len() {
        return Err(GaitError::TimeBaseMismatch(format!(
            "vector operands have {} and {} samples",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter()
        .zip(b)
        .map(|(pa, pb)| match (pa, pb) {
            (Some(pa), Some(pb)) => Some(pb - pa),
            _ => None,
        })
        .collect())
}

/// Orthonormal right-handed frame from two non-collinear directions at a
/// single sample.
///
/// `primary_dir` becomes the axis named `primary_axis` exactly; the axis
/// named `plane_axis` lies in the plane spanned by both directions, on
/// the `plane_dir` side; the third axis completes the right-handed triad.
pub fn frame(
    origin: Point,
    primary_dir: Vec3,
    plane_dir: Vec3,
    primary_axis: Axis,
    plane_axis: Axis,
) -> Result<Transform> {
    frame_at(0, origin, primary_dir, plane_dir, primary_axis, plane_axis)
}

fn frame_at(
    sample: usize,
    origin: Point,
    primary_dir: Vec3,
    plane_dir: Vec3,
    primary_axis: Axis,
    plane_axis: Axis,
) -> Result<Transform> {
    if primary_axis == plane_axis {
        return Err(GaitError::DegenerateGeometry {
            sample,
            reason: "primary and in-plane axis names are identical".to_string(),
        });
    }
    let primary_norm = primary_dir.norm();
    let plane_norm = plane_dir.norm();
    if primary_norm * primary_norm <= DEGENERACY_TOL || plane_norm * plane_norm <= DEGENERACY_TOL {
        return Err(GaitError::DegenerateGeometry {
            sample,
            reason: "vanishing axis direction".to_string(),
        });
    }
    let u = primary_dir / primary_norm;
    let p = plane_dir / plane_norm;

    // Third axis first: u × p (order chosen so it comes out along the
    // positive remaining axis), then the in-plane axis closes the triad.
    let ordered = cyclic(primary_axis, plane_axis);
    let w = if ordered { u.cross(&p) } else { p.cross(&u) };
    let w_norm = w.norm();
    if w_norm * w_norm <= DEGENERACY_TOL {
        return Err(GaitError::DegenerateGeometry {
            sample,
            reason: "primary and in-plane directions are parallel".to_string(),
        });
    }
    let w = w / w_norm;
    let v = if ordered { w.cross(&u) } else { u.cross(&w) };

    let mut m = Matrix3::zeros();
    m.set_column(primary_axis.index(), &u);
    m.set_column(plane_axis.index(), &v);
    m.set_column(Axis::remaining(primary_axis, plane_axis).index(), &w);

    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation::from_matrix_unchecked(m));
    Ok(Transform::from_parts(
        Translation3::from(origin.coords),
        rotation,
    ))
}

/// Frame construction over equal-length series. Samples where any input
/// is missing come out as `None`; samples that are present but degenerate
/// (parallel directions) are a detected error, not NaN.
pub fn build_frame(
    origin: &PointSeries,
    primary: &VectorSeries,
    plane: &VectorSeries,
    primary_axis: Axis,
    plane_axis: Axis,
) -> Result<TransformSeries> {
    if origin.len() != primary.len() || origin.len() != plane.len() {
        return Err(GaitError::TimeBaseMismatch(format!(
            "frame inputs have {}, {} and {} samples",
            origin.len(),
            primary.len(),
            plane.len()
        )));
    }
    let mut out = Vec::with_capacity(origin.len());
    for (i, ((o, u), p)) in origin.iter().zip(primary).zip(plane).enumerate() {
        match (o, u, p) {
            (Some(o), Some(u), Some(p)) => {
                out.push(Some(frame_at(i, *o, *u, *p, primary_axis, plane_axis)?))
            }
            _ => out.push(None),
        }
    }
    Ok(out)
}

/// Per sample, the child's pose expressed in the parent's local frame:
/// `parent⁻¹ · child`. Both series must share one time base.
pub fn local_coordinates(
    child: &TransformSeries,
    parent: &TransformSeries,
) -> Result<TransformSeries> {
    if child.len() != parent.len() {
        return Err(GaitError::TimeBaseMismatch(format!(
            "child has {} samples, parent has {}",
            child.len(),
            parent.len()
        )));
    }
    Ok(child
        .iter()
        .zip(parent)
        .map(|(c, p)| match (c, p) {
            (Some(c), Some(p)) => Some(p.inverse() * c),
            _ => None,
        })
        .collect())
}

/// Intrinsic Tait-Bryan angles [degrees] of a rotation.
///
/// At the gimbal-lock boundary (middle angle at ±90°) only the sum or
/// difference of the first and third angles is observable; the tie-break
/// is deterministic: the first angle is forced to 0 and its value folded
/// into the third, so recomposition still reproduces the rotation.
pub fn euler_angles(rotation: &Rotation, seq: EulerSequence) -> Vec3 {
    let m = rotation.matrix();
    let (i, j, k) = (seq.0.index(), seq.1.index(), seq.2.index());
    let sigma = if cyclic(seq.0, seq.1) { 1.0 } else { -1.0 };

    let s2 = (sigma * m[(i, k)]).clamp(-1.0, 1.0);
    let theta2 = s2.asin();
    let (theta1, theta3) = if s2.abs() >= GIMBAL_LOCK_TOL {
        (0.0, (sigma * m[(j, i)]).atan2(m[(j, j)]))
    } else {
        (
            (-sigma * m[(j, k)]).atan2(m[(k, k)]),
            (-sigma * m[(i, j)]).atan2(m[(i, i)]),
        )
    };
    Vec3::new(
        theta1.to_degrees(),
        theta2.to_degrees(),
        theta3.to_degrees(),
    )
}

/// Rotation from intrinsic Tait-Bryan angles [degrees]. Inverse of
/// [`euler_angles`] away from gimbal lock.
pub fn compose_euler(angles_deg: &Vec3, seq: EulerSequence) -> Rotation {
    Rotation::from_axis_angle(&seq.0.unit(), angles_deg.x.to_radians())
        * Rotation::from_axis_angle(&seq.1.unit(), angles_deg.y.to_radians())
        * Rotation::from_axis_angle(&seq.2.unit(), angles_deg.z.to_radians())
}

/// Rotation angle series [degrees] for each valid sample of a transform
/// series.
pub fn decompose_euler(
    transforms: &TransformSeries,
    seq: EulerSequence,
) -> Vec<Option<Vec3>> {
    transforms
        .iter()
        .map(|t| {
            t.as_ref()
                .map(|t| euler_angles(&t.rotation.to_rotation_matrix(), seq))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SEQUENCES: [EulerSequence; 6] = [
        EulerSequence(Axis::X, Axis::Y, Axis::Z),
        EulerSequence(Axis::X, Axis::Z, Axis::Y),
        EulerSequence(Axis::Y, Axis::X, Axis::Z),
        EulerSequence(Axis::Y, Axis::Z, Axis::X),
        EulerSequence(Axis::Z, Axis::X, Axis::Y),
        EulerSequence(Axis::Z, Axis::Y, Axis::X),
    ];

    #[test]
    fn test_vector_is_per_sample_difference() {
        let a = vec![Some(Point::new(1.0, 0.0, 0.0)), None];
        let b = vec![Some(Point::new(1.0, 2.0, 0.0)), Some(Point::origin())];
        let v = vector(&a, &b).unwrap();
        assert_eq!(v.len(), 2);
        assert_relative_eq!(v[0].unwrap(), Vec3::new(0.0, 2.0, 0.0));
        assert!(v[1].is_none());
    }

    #[test]
    fn test_frame_is_orthonormal_right_handed() {
        let combos = [
            (Axis::X, Axis::Y),
            (Axis::Y, Axis::Z),
            (Axis::Z, Axis::X),
            (Axis::X, Axis::Z),
            (Axis::Z, Axis::Y),
            (Axis::Y, Axis::X),
        ];
        let primary = Vec3::new(0.3, -0.2, 0.9);
        let plane = Vec3::new(-0.5, 0.8, 0.1);
        for (pa, ia) in combos {
            let t = frame(Point::new(1.0, 2.0, 3.0), primary, plane, pa, ia).unwrap();
            let m = t.rotation.to_rotation_matrix();
            assert_relative_eq!(m.matrix().determinant(), 1.0, epsilon = 1e-12);
            let mtm = m.matrix().transpose() * m.matrix();
            assert_relative_eq!(mtm, Matrix3::identity(), epsilon = 1e-12);
            // primary direction lands on its named axis exactly
            let col = m.matrix().column(pa.index()).into_owned();
            assert_relative_eq!(col, primary.normalize(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_frame_named_axes_match_anatomical_expectation() {
        // x lateral, anterior in the xy plane: z must come out up.
        let t = frame(
            Point::origin(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.2, 1.0, 0.0),
            Axis::X,
            Axis::Y,
        )
        .unwrap();
        let m = t.rotation.to_rotation_matrix();
        assert_relative_eq!(
            m.matrix().column(2).into_owned(),
            Vec3::z(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_frame_detects_parallel_directions() {
        let err = frame(
            Point::origin(),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Axis::X,
            Axis::Y,
        )
        .unwrap_err();
        assert!(matches!(err, GaitError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_build_frame_propagates_missing_samples() {
        let origin = vec![Some(Point::origin()), None, Some(Point::origin())];
        let primary = vec![Some(Vec3::x()), Some(Vec3::x()), Some(Vec3::x())];
        let plane = vec![Some(Vec3::y()), Some(Vec3::y()), None];
        let frames = build_frame(&origin, &primary, &plane, Axis::X, Axis::Y).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_some());
        assert!(frames[1].is_none());
        assert!(frames[2].is_none());
    }

    #[test]
    fn test_local_coordinates_of_self_is_identity() {
        let t = frame(
            Point::new(0.4, -1.0, 2.0),
            Vec3::new(0.1, 0.9, 0.2),
            Vec3::new(1.0, 0.0, -0.3),
            Axis::Z,
            Axis::X,
        )
        .unwrap();
        let series = vec![Some(t), Some(t)];
        let local = local_coordinates(&series, &series).unwrap();
        for l in local.into_iter().flatten() {
            assert_relative_eq!(l.translation.vector.norm(), 0.0, epsilon = 1e-12);
            assert_relative_eq!(l.rotation.angle(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_euler_round_trip_all_sequences() {
        let angles = Vec3::new(25.0, -40.0, 70.0);
        for seq in SEQUENCES {
            let r = compose_euler(&angles, seq);
            let back = euler_angles(&r, seq);
            assert_relative_eq!(back, angles, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_euler_recompose_matches_rotation() {
        for seq in SEQUENCES {
            let r = compose_euler(&Vec3::new(-110.0, 35.0, 12.0), seq);
            let r2 = compose_euler(&euler_angles(&r, seq), seq);
            assert_relative_eq!(r, r2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_gimbal_lock_tie_break_is_deterministic() {
        // Middle angle at exactly +90: first angle must come out 0 and
        // the recomposed rotation must still match.
        let r = compose_euler(&Vec3::new(30.0, 90.0, 40.0), EulerSequence::XYZ);
        let back = euler_angles(&r, EulerSequence::XYZ);
        assert_relative_eq!(back.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(back.y, 90.0, epsilon = 1e-6);
        assert_relative_eq!(back.z, 70.0, epsilon = 1e-6);
        let r2 = compose_euler(&back, EulerSequence::XYZ);
        assert_relative_eq!(r, r2, epsilon = 1e-9);
    }

    #[test]
    fn test_sequence_parsing() {
        assert_eq!(EulerSequence::parse("XYZ").unwrap(), EulerSequence::XYZ);
        assert_eq!(EulerSequence::parse("zyx").unwrap(), EulerSequence::ZYX);
        assert!(EulerSequence::parse("XXZ").is_err());
        assert!(EulerSequence::parse("XY").is_err());
        assert!(EulerSequence::parse("XYW").is_err());
    }
}
