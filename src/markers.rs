//! Labeled 3D marker trajectories sharing one time base.
//!
//! This is the narrow interface to the external motion-capture reader:
//! enumerate marker names, fetch a point series by name, query the time
//! vector. The reader's rename table (C3D labels to CGM names) is applied
//! here. Input series are read-only after load; derived quantities are
//! appended as new named series, never by mutating existing ones.

use std::collections::BTreeMap;

use crate::error::{GaitError, Result};
use crate::types::PointSeries;

#[derive(Clone, Debug, Default)]
pub struct MarkerSet {
    time: Vec<f64>,
    series: BTreeMap<String, PointSeries>,
}

impl MarkerSet {
    /// Empty set over an explicit time vector [s].
    pub fn new(time: Vec<f64>) -> Self {
        MarkerSet {
            time,
            series: BTreeMap::new(),
        }
    }

    /// Empty set of `samples` samples at a fixed rate [Hz].
    pub fn with_sample_rate(samples: usize, rate_hz: f64) -> Self {
        let time = (0..samples).map(|i| i as f64 / rate_hz).collect();
        Self::new(time)
    }

    /// Sample count shared by every series.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Shared time vector [s].
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Add (or replace) a named series. The series must match the shared
    /// time base.
    pub fn insert(&mut self, name: &str, series: PointSeries) -> Result<()> {
        if series.len() != self.time.len() {
            return Err(GaitError::TimeBaseMismatch(format!(
                "series '{}' has {} samples, acquisition has {}",
                name,
                series.len(),
                self.time.len()
            )));
        }
        self.series.insert(name.to_string(), series);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PointSeries> {
        self.series.get(name)
    }

    /// Fetch a series that the caller cannot proceed without.
    pub fn require(&self, name: &str) -> Result<&PointSeries> {
        self.series
            .get(name)
            .ok_or_else(|| GaitError::MissingMarker(name.to_string()))
    }

    /// Rename one marker. Fails if the source label is absent.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let series = self
            .series
            .remove(from)
            .ok_or_else(|| GaitError::MissingMarker(from.to_string()))?;
        self.series.insert(to.to_string(), series);
        Ok(())
    }

    /// Apply a rename table. Entries whose source label is absent are
    /// skipped: the same table is reused across static and gait trials,
    /// and e.g. medial markers only exist in the static one.
    pub fn apply_rename(&mut self, table: &BTreeMap<String, String>) {
        for (from, to) in table {
            if let Some(series) = self.series.remove(from) {
                self.series.insert(to.clone(), series);
            } else {
                log::debug!("rename {} -> {}: source label absent, skipped", from, to);
            }
        }
    }
}
