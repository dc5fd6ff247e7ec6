//! Static anatomical calibration: segment frames and joint centers.
//!
//! Frame constructions follow the Conventional Gait Model; the hip joint
//! center uses a leg-length regression.
//!
//! References:
//! - Davis et al., "A gait analysis data collection and reduction
//!   technique", Human Movement Science, 1991.
//! - Hara et al., "Predicting the location of the hip joint centres,
//!   impact of age group and sex", Scientific Reports, 2016.
//!
//! Axis convention for every frame, both sides: x toward the subject's
//! right, y anterior, z up (in neutral standing). The left-side lateral
//! flip in [`thigh_frame`]/[`shank_frame`] keeps that convention identical
//! across sides. Each derivation is a pure function of its declared
//! inputs; the caller composes them along the pelvis → hip → thigh →
//! knee → shank → ankle chain.

use std::collections::BTreeMap;

use crate::error::{GaitError, Result};
use crate::geometry::{self, Axis};
use crate::markers::MarkerSet;
use crate::types::{Point, Side, Transform, Vec3};

/// Hara 2016 regression coefficients: hip-center offset from the ASIS
/// midpoint in the pelvis frame, as `intercept + slope * leg_length`,
/// everything in meters. Lateral is mirrored for the left side.
const HARA_LATERAL: (f64, f64) = (0.008, 0.086);
const HARA_ANTERIOR: (f64, f64) = (0.011, -0.063);
const HARA_VERTICAL: (f64, f64) = (-0.009, -0.078);

/// One static-pose position per marker: the mean over each marker's valid
/// samples of the calibration trial. Virtual points (joint centers) are
/// inserted under their own names as they are derived.
#[derive(Clone, Debug, Default)]
pub struct StaticSnapshot {
    points: BTreeMap<String, Point>,
}

impl StaticSnapshot {
    pub fn from_marker_set(ms: &MarkerSet) -> Self {
        let mut points = BTreeMap::new();
        for name in ms.names() {
            let series = match ms.get(name) {
                Some(s) => s,
                None => continue,
            };
            let valid: Vec<&Point> = series.iter().flatten().collect();
            if valid.is_empty() {
                log::debug!("marker '{}' has no valid static sample, skipped", name);
                continue;
            }
            let sum = valid.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
            points.insert(name.to_string(), Point::from(sum / valid.len() as f64));
        }
        StaticSnapshot { points }
    }

    pub fn get(&self, name: &str) -> Result<Point> {
        self.points
            .get(name)
            .copied()
            .ok_or_else(|| GaitError::MissingMarker(name.to_string()))
    }

    pub fn insert(&mut self, name: String, point: Point) {
        self.points.insert(name, point);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.points.contains_key(name)
    }

    pub fn points(&self) -> &BTreeMap<String, Point> {
        &self.points
    }
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::from((a.coords + b.coords) / 2.0)
}

/// Pelvis frame from the four iliac-spine markers: origin at the PSIS
/// midpoint, x axis along LASIS→RASIS, sagittal plane fixed by the
/// posterior midpoint so y points anterior and z up.
pub fn pelvis_frame(snapshot: &StaticSnapshot) -> Result<Transform> {
    let rasi = snapshot.get("RASI")?;
    let lasi = snapshot.get("LASI")?;
    let rpsi = snapshot.get("RPSI")?;
    let lpsi = snapshot.get("LPSI")?;

    let origin = midpoint(rpsi, lpsi);
    let lateral = rasi - lasi;
    let anterior = midpoint(rasi, lasi) - origin;
    geometry::frame(origin, lateral, anterior, Axis::X, Axis::Y)
}

/// Hip joint center (Hara 2016): regression offset from the ASIS midpoint
/// expressed in the pelvis frame, lateral component sign-flipped for the
/// left side. Fails when leg length is non-positive or pelvis markers are
/// missing.
pub fn hip_joint_center(snapshot: &StaticSnapshot, leg_length: f64, side: Side) -> Result<Point> {
    if !(leg_length > 0.0) {
        return Err(GaitError::InsufficientAnthropometry(format!(
            "leg length must be positive, got {}",
            leg_length
        )));
    }
    let pelvis = pelvis_frame(snapshot)?;
    let mid_asis = midpoint(snapshot.get("RASI")?, snapshot.get("LASI")?);
    let offset = Vec3::new(
        side.lateral_sign() * (HARA_LATERAL.0 + HARA_LATERAL.1 * leg_length),
        HARA_ANTERIOR.0 + HARA_ANTERIOR.1 * leg_length,
        HARA_VERTICAL.0 + HARA_VERTICAL.1 * leg_length,
    );
    let local = pelvis.inverse_transform_point(&mid_asis) + offset;
    Ok(pelvis.transform_point(&local))
}

/// Thigh frame: origin at the hip center, z axis from the lateral knee
/// marker up to the hip center, frontal plane fixed by the thigh wand
/// marker (lateral direction flipped on the left so x points to the
/// subject's right).
pub fn thigh_frame(
    hip_center: Point,
    lateral_knee: Point,
    thigh_wand: Point,
    side: Side,
) -> Result<Transform> {
    let long_axis = hip_center - lateral_knee;
    let lateral = (thigh_wand - lateral_knee) * side.lateral_sign();
    geometry::frame(hip_center, long_axis, lateral, Axis::Z, Axis::X)
}

/// Knee joint center: offset medially from the lateral epicondyle marker
/// along the thigh frame's x axis by half the knee width plus one marker
/// radius. The side flips the medial direction, not the magnitude.
pub fn knee_joint_center(
    hip_center: Point,
    lateral_knee: Point,
    thigh_wand: Point,
    knee_width: f64,
    marker_radius: f64,
    side: Side,
) -> Result<Point> {
    if !(knee_width > 0.0) {
        return Err(GaitError::InsufficientAnthropometry(format!(
            "knee width must be positive, got {}",
            knee_width
        )));
    }
    let frame = thigh_frame(hip_center, lateral_knee, thigh_wand, side)?;
    let lateral_axis: Vec3 = frame.rotation * Vec3::x();
    let medial = lateral_axis * (-side.lateral_sign());
    Ok(lateral_knee + medial * (knee_width / 2.0 + marker_radius))
}

/// Shank frame: same construction as [`thigh_frame`], one joint down
/// (knee center, lateral malleolus, shank wand).
pub fn shank_frame(
    knee_center: Point,
    lateral_malleolus: Point,
    shank_wand: Point,
    side: Side,
) -> Result<Transform> {
    let long_axis = knee_center - lateral_malleolus;
    let lateral = (shank_wand - lateral_malleolus) * side.lateral_sign();
    geometry::frame(knee_center, long_axis, lateral, Axis::Z, Axis::X)
}

/// Ankle joint center: offset medially from the lateral malleolus marker
/// along the shank frame's x axis by half the ankle width plus one marker
/// radius.
pub fn ankle_joint_center(
    knee_center: Point,
    lateral_malleolus: Point,
    shank_wand: Point,
    ankle_width: f64,
    marker_radius: f64,
    side: Side,
) -> Result<Point> {
    if !(ankle_width > 0.0) {
        return Err(GaitError::InsufficientAnthropometry(format!(
            "ankle width must be positive, got {}",
            ankle_width
        )));
    }
    let frame = shank_frame(knee_center, lateral_malleolus, shank_wand, side)?;
    let lateral_axis: Vec3 = frame.rotation * Vec3::x();
    let medial = lateral_axis * (-side.lateral_sign());
    Ok(lateral_malleolus + medial * (ankle_width / 2.0 + marker_radius))
}

/// Midpoint shortcut: joint center as the midpoint between the lateral
/// and medial markers. Alternate estimator to the anatomical inference
/// above; kept under its own name, not used by the pipeline.
pub fn joint_center_midpoint(lateral: Point, medial: Point) -> Point {
    midpoint(lateral, medial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Axis-aligned pelvis so every expectation is hand-computable:
    /// pelvis origin (0, 0, 0.95), identity orientation.
    fn snapshot() -> StaticSnapshot {
        let mut s = StaticSnapshot::default();
        s.insert("RASI".to_string(), Point::new(0.12, 0.17, 0.95));
        s.insert("LASI".to_string(), Point::new(-0.12, 0.17, 0.95));
        s.insert("RPSI".to_string(), Point::new(0.05, 0.0, 0.95));
        s.insert("LPSI".to_string(), Point::new(-0.05, 0.0, 0.95));
        s
    }

    #[test]
    fn test_pelvis_frame_axis_aligned_case() {
        let pelvis = pelvis_frame(&snapshot()).unwrap();
        assert_relative_eq!(
            pelvis.translation.vector,
            Vec3::new(0.0, 0.0, 0.95),
            epsilon = 1e-12
        );
        assert_relative_eq!(pelvis.rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hip_center_matches_hand_computed_regression() {
        let leg = 0.85;
        let rhjc = hip_joint_center(&snapshot(), leg, Side::Right).unwrap();
        let expected = Point::new(
            0.008 + 0.086 * leg,
            0.17 + (0.011 - 0.063 * leg),
            0.95 + (-0.009 - 0.078 * leg),
        );
        assert_relative_eq!(rhjc, expected, epsilon = 1e-9);

        let lhjc = hip_joint_center(&snapshot(), leg, Side::Left).unwrap();
        assert_relative_eq!(lhjc.x, -rhjc.x, epsilon = 1e-9);
        assert_relative_eq!(lhjc.y, rhjc.y, epsilon = 1e-9);
        assert_relative_eq!(lhjc.z, rhjc.z, epsilon = 1e-9);
    }

    #[test]
    fn test_hip_center_rejects_non_positive_leg_length() {
        let err = hip_joint_center(&snapshot(), 0.0, Side::Right).unwrap_err();
        assert!(matches!(err, GaitError::InsufficientAnthropometry(_)));
    }

    #[test]
    fn test_knee_center_offset_magnitude_both_sides() {
        let width = 0.08;
        let radius = 0.01;
        for side in Side::BOTH {
            let sign = side.lateral_sign();
            let hjc = Point::new(sign * 0.08, 0.0, 0.9);
            let kne = Point::new(sign * 0.16, 0.0, 0.5);
            let thi = Point::new(sign * 0.20, 0.03, 0.65);
            let kjc = knee_joint_center(hjc, kne, thi, width, radius, side).unwrap();
            assert_relative_eq!((kjc - kne).norm(), width / 2.0 + radius, epsilon = 1e-12);
            // medial: toward the body midline
            assert!(sign * (kjc.x - kne.x) < 0.0);
        }
    }

    #[test]
    fn test_ankle_center_offset_magnitude() {
        let width = 0.05;
        let radius = 0.01;
        let kjc = Point::new(0.11, 0.0, 0.5);
        let ank = Point::new(0.16, 0.0, 0.1);
        let tib = Point::new(0.19, 0.02, 0.3);
        let ajc = ankle_joint_center(kjc, ank, tib, width, radius, Side::Right).unwrap();
        assert_relative_eq!((ajc - ank).norm(), width / 2.0 + radius, epsilon = 1e-12);
    }

    #[test]
    fn test_thigh_frame_points_up_and_right() {
        let hjc = Point::new(0.08, 0.0, 0.9);
        let kne = Point::new(0.16, 0.0, 0.5);
        let thi = Point::new(0.20, 0.03, 0.65);
        let frame = thigh_frame(hjc, kne, thi, Side::Right).unwrap();
        let z: Vec3 = frame.rotation * Vec3::z();
        let x: Vec3 = frame.rotation * Vec3::x();
        assert!(z.z > 0.9); // long axis roughly up in standing
        assert!(x.x > 0.0); // lateral axis toward the subject's right
    }

    #[test]
    fn test_midpoint_estimator() {
        let m = joint_center_midpoint(Point::new(0.16, 0.0, 0.5), Point::new(0.06, 0.0, 0.5));
        assert_relative_eq!(m, Point::new(0.11, 0.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_pelvis_marker_is_structural() {
        let mut s = snapshot();
        s.points.remove("RPSI");
        assert!(matches!(
            pelvis_frame(&s),
            Err(GaitError::MissingMarker(_))
        ));
    }
}
