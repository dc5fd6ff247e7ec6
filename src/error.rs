//! Error kinds surfaced by the gait-model core.
//!
//! Structural failures (missing required markers, degenerate static
//! geometry, invalid anthropometric scalars, unusable clusters) abort the
//! whole derivation and are surfaced immediately through these variants.
//! Per-sample failures never reach this enum: the affected sample is
//! recorded as `None` in the output series, which always keeps the input
//! length.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GaitError {
    /// Collinear/parallel axis inputs where an orthonormal frame was
    /// required. Detected explicitly, never propagated as NaN.
    #[error("degenerate geometry at sample {sample}: {reason}")]
    DegenerateGeometry { sample: usize, reason: String },

    /// Missing or non-positive scalar measurement.
    #[error("insufficient anthropometry: {0}")]
    InsufficientAnthropometry(String),

    /// Fewer than 3 usable (non-collinear) markers for a rigid fit.
    #[error("degenerate cluster '{name}': {reason}")]
    DegenerateCluster { name: String, reason: String },

    /// A required marker is absent from the input marker set.
    #[error("required marker '{0}' is missing from the marker set")]
    MissingMarker(String),

    /// One time sample cannot be resolved, in a context where it cannot
    /// be marked invalid in-band.
    #[error("sample {sample} cannot be resolved: {reason}")]
    InvalidSample { sample: usize, reason: String },

    /// Two series that must share a time base have different lengths.
    #[error("time base mismatch: {0}")]
    TimeBaseMismatch(String),

    /// Euler axis sequence that is not three distinct axes.
    #[error("unsupported Euler sequence '{0}': expected three distinct axes, e.g. \"XYZ\"")]
    UnsupportedSequence(String),
}

pub type Result<T> = std::result::Result<T, GaitError>;
