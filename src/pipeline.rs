//! End-to-end CGM pipeline.
//!
//! `calibrate` runs the static-trial estimation chain (pelvis → hip →
//! thigh → knee → shank → ankle) and captures one rigid cluster per
//! segment, with the inferred joint centers embedded as virtual points.
//! `analyze` then walks a dynamic trial: each segment cluster is tracked
//! to reconstruct the joint centers sample by sample, segment frames are
//! rebuilt from the reconstructed points, and adjacent frames are
//! decomposed into clinical joint angles.
//!
//! Reconstruction order follows the data-dependency chain: the hip
//! centers reconstructed from the pelvis cluster become observed markers
//! for the thigh clusters, whose knee centers feed the shank clusters,
//! and so on down to the feet.

use std::collections::BTreeMap;

use crate::anatomy::{self, StaticSnapshot};
use crate::angles::{self, Joint, JointAngleSeries};
use crate::anthropometry::{self, Anthropometry};
use crate::chain;
use crate::cluster::{self, Cluster, TrackedCluster};
use crate::config::CgmOptions;
use crate::error::{GaitError, Result};
use crate::markers::MarkerSet;
use crate::types::{PointSeries, Side, Transform, TransformSeries};

/// One value per body side.
#[derive(Clone, Debug)]
pub struct PerSide<T> {
    pub right: T,
    pub left: T,
}

impl<T> PerSide<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Right => &self.right,
            Side::Left => &self.left,
        }
    }

    fn try_build(mut f: impl FnMut(Side) -> Result<T>) -> Result<PerSide<T>> {
        Ok(PerSide {
            right: f(Side::Right)?,
            left: f(Side::Left)?,
        })
    }
}

/// Everything derived from the static trial, immutable input to every
/// dynamic-trial run.
#[derive(Clone, Debug)]
pub struct Calibration {
    pub options: CgmOptions,
    pub anthropometry: Anthropometry,
    /// Static pose including the inferred joint centers ("RHJC", "LKJC",
    /// ...).
    pub snapshot: StaticSnapshot,
    /// Pelvis frame at calibration.
    pub pelvis: Transform,
    pub pelvis_cluster: Cluster,
    pub thigh_clusters: PerSide<Cluster>,
    pub shank_clusters: PerSide<Cluster>,
    pub foot_clusters: PerSide<Cluster>,
}

/// Output of one dynamic-trial run.
#[derive(Clone, Debug)]
pub struct GaitAnalysis {
    /// Shared time vector [s].
    pub time: Vec<f64>,
    /// Segment pose series: "Pelvis", "RThigh", "LShank", "RFoot", ...
    pub segments: BTreeMap<String, TransformSeries>,
    /// Reconstructed joint-center series: "RHJC", "LKJC", "RAJC", ...
    pub points: BTreeMap<String, PointSeries>,
    /// Clinical joint angles: "RHip", "LKnee", "RAnkle", ...
    pub angles: BTreeMap<String, JointAngleSeries>,
}

fn resolve_scalar(
    label: &str,
    override_value: Option<f64>,
    mut measure: impl FnMut(Side) -> Result<f64>,
    preferred: Side,
) -> Result<f64> {
    if let Some(v) = override_value {
        return Ok(v);
    }
    // Measure on the preferred side, falling back to the other; the
    // reference workflow measures widths on the left only.
    match measure(preferred) {
        Ok(v) => Ok(v),
        Err(first) => {
            let other = match preferred {
                Side::Right => Side::Left,
                Side::Left => Side::Right,
            };
            measure(other).map_err(|_| {
                log::debug!("could not measure {} on either side", label);
                first
            })
        }
    }
}

/// Static-trial calibration: anthropometry, joint centers and one rigid
/// reference cluster per segment.
pub fn calibrate(static_trial: &MarkerSet, options: &CgmOptions) -> Result<Calibration> {
    let mut trial = static_trial.clone();
    trial.apply_rename(&options.marker_rename);

    let marker_radius = options.marker_radius;
    let leg_length = resolve_scalar(
        "leg length",
        options.leg_length,
        |side| anthropometry::measure_leg_length(&trial, side),
        Side::Right,
    )?;
    let knee_width = resolve_scalar(
        "knee width",
        options.knee_width,
        |side| anthropometry::measure_knee_width(&trial, side, marker_radius),
        Side::Left,
    )?;
    let ankle_width = resolve_scalar(
        "ankle width",
        options.ankle_width,
        |side| anthropometry::measure_ankle_width(&trial, side, marker_radius),
        Side::Left,
    )?;
    let anthro = Anthropometry {
        marker_radius,
        leg_length,
        knee_width,
        ankle_width,
    };
    anthro.validate()?;
    log::info!(
        "anthropometry: leg {:.3} m, knee {:.3} m, ankle {:.3} m",
        anthro.leg_length,
        anthro.knee_width,
        anthro.ankle_width
    );

    let mut snapshot = StaticSnapshot::from_marker_set(&trial);
    let pelvis = anatomy::pelvis_frame(&snapshot)?;

    for side in Side::BOTH {
        let hjc = anatomy::hip_joint_center(&snapshot, anthro.leg_length, side)?;
        let kne = snapshot.get(&side.marker("KNE"))?;
        let thi = snapshot.get(&side.marker("THI"))?;
        let kjc = anatomy::knee_joint_center(
            hjc,
            kne,
            thi,
            anthro.knee_width,
            anthro.marker_radius,
            side,
        )?;
        let ank = snapshot.get(&side.marker("ANK"))?;
        let tib = snapshot.get(&side.marker("TIB"))?;
        let ajc = anatomy::ankle_joint_center(
            kjc,
            ank,
            tib,
            anthro.ankle_width,
            anthro.marker_radius,
            side,
        )?;
        snapshot.insert(side.marker("HJC"), hjc);
        snapshot.insert(side.marker("KJC"), kjc);
        snapshot.insert(side.marker("AJC"), ajc);
        log::debug!(
            "{:?} joint centers: hip {:?}, knee {:?}, ankle {:?}",
            side,
            hjc,
            kjc,
            ajc
        );
    }

    let pelvis_cluster = Cluster::from_snapshot(
        "Pelvis",
        &snapshot,
        &["RASI", "LASI", "RPSI", "LPSI", "RHJC", "LHJC"],
    )?;
    let thigh_clusters = PerSide::try_build(|side| {
        Cluster::from_snapshot(
            &side.marker("Thigh"),
            &snapshot,
            &[
                side.marker("KNE"),
                side.marker("THI"),
                side.marker("HJC"),
                side.marker("KJC"),
            ],
        )
    })?;
    let shank_clusters = PerSide::try_build(|side| {
        Cluster::from_snapshot(
            &side.marker("Shank"),
            &snapshot,
            &[
                side.marker("ANK"),
                side.marker("TIB"),
                side.marker("KJC"),
                side.marker("AJC"),
            ],
        )
    })?;
    let foot_clusters = PerSide::try_build(|side| {
        Cluster::from_snapshot(
            &side.marker("Foot"),
            &snapshot,
            &[
                side.marker("TOE"),
                side.marker("HEE"),
                side.marker("ANK"),
                side.marker("AJC"),
            ],
        )
    })?;

    Ok(Calibration {
        options: options.clone(),
        anthropometry: anthro,
        snapshot,
        pelvis,
        pelvis_cluster,
        thigh_clusters,
        shank_clusters,
        foot_clusters,
    })
}

fn tracked_series(tracked: &TrackedCluster, name: &str) -> Result<PointSeries> {
    tracked
        .points
        .get(name)
        .cloned()
        .ok_or_else(|| GaitError::MissingMarker(name.to_string()))
}

/// Dynamic-trial processing: cluster tracking, segment poses, joint
/// angles. Output series all share the trial's time base; samples that
/// cannot be resolved stay `None`.
pub fn analyze(calibration: &Calibration, gait_trial: &MarkerSet) -> Result<GaitAnalysis> {
    let mut trial = gait_trial.clone();
    trial.apply_rename(&calibration.options.marker_rename);

    let mut segments: BTreeMap<String, TransformSeries> = BTreeMap::new();
    let mut points: BTreeMap<String, PointSeries> = BTreeMap::new();
    let mut angle_series: BTreeMap<String, JointAngleSeries> = BTreeMap::new();

    // Pelvis first: its hip centers become observed markers for the
    // thigh clusters.
    let pelvis_tracked = cluster::track_cluster(&trial, &calibration.pelvis_cluster)?;
    for side in Side::BOTH {
        let name = side.marker("HJC");
        let series = tracked_series(&pelvis_tracked, &name)?;
        trial.insert(&name, series.clone())?;
        points.insert(name, series);
    }
    // Pelvis frame from the cluster-reconstructed iliac markers, so a
    // dropped-out pelvis marker does not invalidate otherwise good
    // samples.
    let mut pelvis_recon = MarkerSet::new(trial.time().to_vec());
    for name in ["RASI", "LASI", "RPSI", "LPSI"] {
        pelvis_recon.insert(name, tracked_series(&pelvis_tracked, name)?)?;
    }
    let pelvis_frames = chain::pelvis_series(&pelvis_recon)?;

    for side in Side::BOTH {
        let thigh_tracked = cluster::track_cluster(&trial, calibration.thigh_clusters.get(side))?;
        let kjc_name = side.marker("KJC");
        let kjc = tracked_series(&thigh_tracked, &kjc_name)?;
        trial.insert(&kjc_name, kjc.clone())?;
        points.insert(kjc_name.clone(), kjc.clone());
        let thigh_frames = chain::thigh_series(
            &tracked_series(&thigh_tracked, &side.marker("HJC"))?,
            &kjc,
            &tracked_series(&thigh_tracked, &side.marker("THI"))?,
            side,
        )?;

        let shank_tracked = cluster::track_cluster(&trial, calibration.shank_clusters.get(side))?;
        let ajc_name = side.marker("AJC");
        let ajc = tracked_series(&shank_tracked, &ajc_name)?;
        trial.insert(&ajc_name, ajc.clone())?;
        points.insert(ajc_name.clone(), ajc.clone());
        let shank_frames = chain::shank_series(
            &tracked_series(&shank_tracked, &kjc_name)?,
            &ajc,
            &tracked_series(&shank_tracked, &side.marker("TIB"))?,
            side,
        )?;

        let foot_tracked = cluster::track_cluster(&trial, calibration.foot_clusters.get(side))?;
        let foot_frames = chain::foot_series(
            &tracked_series(&foot_tracked, &ajc_name)?,
            &tracked_series(&foot_tracked, &side.marker("HEE"))?,
            &tracked_series(&foot_tracked, &side.marker("TOE"))?,
        )?;

        for (joint, proximal, distal) in [
            (Joint::Hip, &pelvis_frames, &thigh_frames),
            (Joint::Knee, &thigh_frames, &shank_frames),
            (Joint::Ankle, &shank_frames, &foot_frames),
        ] {
            let series = angles::joint_angles(proximal, distal, joint, side)?;
            angle_series.insert(series.name.clone(), series);
        }

        segments.insert(side.marker("Thigh"), thigh_frames);
        segments.insert(side.marker("Shank"), shank_frames);
        segments.insert(side.marker("Foot"), foot_frames);
    }
    segments.insert("Pelvis".to_string(), pelvis_frames);

    log::debug!(
        "analysis complete: {} segments, {} joint-angle series over {} samples",
        segments.len(),
        angle_series.len(),
        trial.len()
    );

    Ok(GaitAnalysis {
        time: trial.time().to_vec(),
        segments,
        points,
        angles: angle_series,
    })
}
