//! Kinematic chain: per-segment rigid pose series over a dynamic trial.
//!
//! Axis convention for every segment, both sides: x toward the subject's
//! right, y anterior, z up in the neutral standing pose. Per segment:
//!
//! - pelvis: x along the inter-ASIS line, sagittal plane from the PSIS
//!   midpoint, origin at the PSIS midpoint;
//! - thigh: z along knee→hip, frontal plane from the thigh wand, origin
//!   at the hip center;
//! - shank: z along ankle→knee, frontal plane from the shank wand,
//!   origin at the knee center;
//! - foot: y along heel→toe, transverse plane from the ankle center,
//!   origin at the ankle center.
//!
//! The thigh/shank in-plane (wand) direction is flipped on the left so
//! the x axis points to the subject's right on both sides; that single
//! flip is what lets flexion-positive keep one physical meaning across
//! sides before the clinical sign table is applied.

use crate::error::Result;
use crate::geometry::{self, Axis};
use crate::markers::MarkerSet;
use crate::types::{Point, PointSeries, Side, TransformSeries, VectorSeries};

fn midpoint_series(a: &PointSeries, b: &PointSeries) -> PointSeries {
    a.iter()
        .zip(b)
        .map(|(pa, pb)| match (pa, pb) {
            (Some(pa), Some(pb)) => Some(Point::from((pa.coords + pb.coords) / 2.0)),
            _ => None,
        })
        .collect()
}

fn scale_series(v: &VectorSeries, factor: f64) -> VectorSeries {
    v.iter().map(|x| x.map(|x| x * factor)).collect()
}

/// Pelvis pose series from the four iliac-spine marker series.
pub fn pelvis_series(ms: &MarkerSet) -> Result<TransformSeries> {
    let rasi = ms.require("RASI")?;
    let lasi = ms.require("LASI")?;
    let rpsi = ms.require("RPSI")?;
    let lpsi = ms.require("LPSI")?;

    let origin = midpoint_series(rpsi, lpsi);
    let mid_asis = midpoint_series(rasi, lasi);
    let lateral = geometry::vector(lasi, rasi)?;
    let anterior = geometry::vector(&origin, &mid_asis)?;
    geometry::build_frame(&origin, &lateral, &anterior, Axis::X, Axis::Y)
}

/// Thigh pose series from hip center, knee center and thigh wand series.
pub fn thigh_series(
    hip_center: &PointSeries,
    knee_center: &PointSeries,
    thigh_wand: &PointSeries,
    side: Side,
) -> Result<TransformSeries> {
    let long_axis = geometry::vector(knee_center, hip_center)?;
    let lateral = scale_series(
        &geometry::vector(knee_center, thigh_wand)?,
        side.lateral_sign(),
    );
    geometry::build_frame(hip_center, &long_axis, &lateral, Axis::Z, Axis::X)
}

/// Shank pose series from knee center, ankle center and shank wand series.
pub fn shank_series(
    knee_center: &PointSeries,
    ankle_center: &PointSeries,
    shank_wand: &PointSeries,
    side: Side,
) -> Result<TransformSeries> {
    let long_axis = geometry::vector(ankle_center, knee_center)?;
    let lateral = scale_series(
        &geometry::vector(ankle_center, shank_wand)?,
        side.lateral_sign(),
    );
    geometry::build_frame(knee_center, &long_axis, &lateral, Axis::Z, Axis::X)
}

/// Foot pose series from ankle center, heel and toe marker series. No
/// side flip is needed: heel→toe and heel→ankle already define the same
/// handedness on both sides.
pub fn foot_series(
    ankle_center: &PointSeries,
    heel: &PointSeries,
    toe: &PointSeries,
) -> Result<TransformSeries> {
    let long_axis = geometry::vector(heel, toe)?;
    let up = geometry::vector(heel, ankle_center)?;
    geometry::build_frame(ankle_center, &long_axis, &up, Axis::Y, Axis::Z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;
    use approx::assert_relative_eq;

    fn series(p: Point, n: usize) -> PointSeries {
        vec![Some(p); n]
    }

    #[test]
    fn test_pelvis_series_axis_aligned() {
        let mut ms = MarkerSet::with_sample_rate(2, 100.0);
        ms.insert("RASI", series(Point::new(0.12, 0.17, 0.95), 2)).unwrap();
        ms.insert("LASI", series(Point::new(-0.12, 0.17, 0.95), 2)).unwrap();
        ms.insert("RPSI", series(Point::new(0.05, 0.0, 0.95), 2)).unwrap();
        ms.insert("LPSI", series(Point::new(-0.05, 0.0, 0.95), 2)).unwrap();
        let pelvis = pelvis_series(&ms).unwrap();
        assert_eq!(pelvis.len(), 2);
        let t = pelvis[0].unwrap();
        assert_relative_eq!(t.rotation.angle(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            t.translation.vector,
            Vec3::new(0.0, 0.0, 0.95),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_marker_sample_gives_invalid_pose() {
        let mut ms = MarkerSet::with_sample_rate(2, 100.0);
        let mut rasi = series(Point::new(0.12, 0.17, 0.95), 2);
        rasi[1] = None;
        ms.insert("RASI", rasi).unwrap();
        ms.insert("LASI", series(Point::new(-0.12, 0.17, 0.95), 2)).unwrap();
        ms.insert("RPSI", series(Point::new(0.05, 0.0, 0.95), 2)).unwrap();
        ms.insert("LPSI", series(Point::new(-0.05, 0.0, 0.95), 2)).unwrap();
        let pelvis = pelvis_series(&ms).unwrap();
        assert!(pelvis[0].is_some());
        assert!(pelvis[1].is_none());
    }

    #[test]
    fn test_left_and_right_thigh_share_axis_convention() {
        let n = 1;
        for side in Side::BOTH {
            let s = side.lateral_sign();
            let hjc = series(Point::new(s * 0.08, 0.0, 0.9), n);
            let kjc = series(Point::new(s * 0.11, 0.0, 0.5), n);
            let thi = series(Point::new(s * 0.20, 0.03, 0.65), n);
            let thigh = thigh_series(&hjc, &kjc, &thi, side).unwrap();
            let rot = thigh[0].unwrap().rotation;
            let x: Vec3 = rot * Vec3::x();
            let z: Vec3 = rot * Vec3::z();
            // x toward the subject's right and z up, on both sides
            assert!(x.x > 0.9, "side {:?}: x = {:?}", side, x);
            assert!(z.z > 0.9, "side {:?}: z = {:?}", side, z);
        }
    }

    #[test]
    fn test_foot_series_anterior_long_axis() {
        let ajc = series(Point::new(0.13, 0.0, 0.08), 1);
        let hee = series(Point::new(0.13, -0.05, 0.02), 1);
        let toe = series(Point::new(0.13, 0.20, 0.02), 1);
        let foot = foot_series(&ajc, &hee, &toe).unwrap();
        let rot = foot[0].unwrap().rotation;
        let y: Vec3 = rot * Vec3::y();
        let z: Vec3 = rot * Vec3::z();
        assert!(y.y > 0.99); // long axis anterior
        assert!(z.z > 0.9); // up roughly vertical
    }
}
