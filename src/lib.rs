//! Conventional Gait Model core.
//!
//! Turns optical motion-capture marker trajectories into clinical gait
//! kinematics: anatomical joint centers, segment poses for the pelvis,
//! thighs, shanks and feet, and flexion/abduction/rotation angle curves
//! for hips, knees and ankles.
//!
//! Segment frame construction follows Davis et al. 1991, hip joint
//! centers use the Hara et al. 2016 leg-length regression, and dynamic
//! trials are tracked per segment with least-squares rigid-cluster fits
//! so marker dropouts degrade gracefully instead of killing a trial.
//!
//! Typical use is two calls: [`calibrate`] on a static standing trial,
//! then [`analyze`] on each walking trial.

pub mod anatomy;
pub mod angles;
pub mod anthropometry;
pub mod chain;
pub mod cluster;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod markers;
pub mod pipeline;
pub mod types;

pub use angles::{Joint, JointAngleSeries};
pub use anthropometry::Anthropometry;
pub use config::CgmOptions;
pub use error::{GaitError, Result};
pub use markers::MarkerSet;
pub use pipeline::{analyze, calibrate, Calibration, GaitAnalysis};
pub use types::{
    AngleSeries, Point, PointSeries, Rotation, Side, Transform, TransformSeries, Vec3,
    VectorSeries,
};
