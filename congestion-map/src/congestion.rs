//! # Time-indexed congestion lookup
//!
//! Congestion arrives as a fixed sequence of snapshots, one per sampling instant
//! (every 10 minutes in practice), each mapping road IDs to a congestion index.
//! Looking up a road at a given time means finding the snapshot stamped with exactly
//! that minute, then classifying the road's index into a severity band.

use crate::style::Color;
use chrono::NaiveDateTime;
use congestion_data::timestamp::truncate_to_minute;
use congestion_data::{RawSnapshot, format_timestamp};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;
use tracing::{debug, warn};

pub const FREE_FLOWING_COLOR: Color = Color::from_rgb(0x52, 0xC4, 0x1A);
pub const LIGHT_COLOR: Color = Color::from_rgb(0xFA, 0xAD, 0x14);
pub const MODERATE_COLOR: Color = Color::from_rgb(0xFF, 0x7A, 0x45);
pub const SEVERE_COLOR: Color = Color::from_rgb(0xFF, 0x4D, 0x4F);
/// Only used in the detail panel; drawing falls back to [`SEVERE_COLOR`].
pub const NO_DATA_COLOR: Color = Color::from_rgb(0x99, 0x99, 0x99);

/// Lower bound (inclusive) of the light congestion band.
const LIGHT_THRESHOLD: f64 = 2.0;
/// Lower bound (inclusive) of the moderate congestion band.
const MODERATE_THRESHOLD: f64 = 4.0;
/// Lower bound (inclusive) of the severe congestion band.
const SEVERE_THRESHOLD: f64 = 6.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CongestionError {
    #[error("No congestion snapshot for {0}")]
    NoSnapshotForTime(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    FreeFlowing,
    Light,
    Moderate,
    Severe,
    Unknown,
}

/// Where a classification is being rendered.
///
/// The two contexts disagree on unknown values:
/// map drawing shows them as severe red, the detail panel as gray "No data".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorContext {
    Drawing,
    DetailPanel,
}

impl Severity {
    /// Classifies a congestion index. Band lower bounds are inclusive.
    pub fn from_index(index: f64) -> Self {
        if index.is_nan() {
            Severity::Unknown
        } else if index < LIGHT_THRESHOLD {
            Severity::FreeFlowing
        } else if index < MODERATE_THRESHOLD {
            Severity::Light
        } else if index < SEVERE_THRESHOLD {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }

    pub fn label(self, context: ColorContext) -> &'static str {
        match (self, context) {
            (Severity::FreeFlowing, _) => "Free-flowing",
            (Severity::Light, _) => "Light congestion",
            (Severity::Moderate, _) => "Moderate congestion",
            (Severity::Severe, _) => "Severe congestion",
            (Severity::Unknown, ColorContext::Drawing) => "Unknown",
            (Severity::Unknown, ColorContext::DetailPanel) => "No data",
        }
    }

    pub fn color(self, context: ColorContext) -> Color {
        match (self, context) {
            (Severity::FreeFlowing, _) => FREE_FLOWING_COLOR,
            (Severity::Light, _) => LIGHT_COLOR,
            (Severity::Moderate, _) => MODERATE_COLOR,
            (Severity::Severe, _) | (Severity::Unknown, ColorContext::Drawing) => SEVERE_COLOR,
            (Severity::Unknown, ColorContext::DetailPanel) => NO_DATA_COLOR,
        }
    }
}

/// A road's severity at one instant, along with the index it was derived from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Classification {
    pub severity: Severity,
    /// The congestion index; `None` when missing or not a number.
    pub index: Option<f64>,
}

impl Classification {
    pub fn from_index(index: Option<f64>) -> Self {
        match index {
            Some(value) if value.is_finite() => Self {
                severity: Severity::from_index(value),
                index: Some(value),
            },
            _ => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            severity: Severity::Unknown,
            index: None,
        }
    }

    pub fn color(&self, context: ColorContext) -> Color {
        self.severity.color(context)
    }

    pub fn label(&self, context: ColorContext) -> &'static str {
        self.severity.label(context)
    }
}

/// Congestion indexes for every road at a single sampling instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CongestionSnapshot {
    timestamp: NaiveDateTime,
    /// `None` marks an entry that is present but not a valid number.
    values: HashMap<String, Option<f64>>,
}

impl CongestionSnapshot {
    pub fn new(timestamp: NaiveDateTime, values: HashMap<String, Option<f64>>) -> Self {
        Self {
            timestamp: truncate_to_minute(timestamp),
            values,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// The raw index for a road, if present and numeric.
    pub fn index_of(&self, road_id: &str) -> Option<f64> {
        self.values.get(road_id).copied().flatten()
    }

    /// Classifies a road. Missing and non-numeric entries are [`Severity::Unknown`].
    pub fn classify(&self, road_id: &str) -> Classification {
        Classification::from_index(self.index_of(road_id))
    }
}

impl TryFrom<&RawSnapshot> for CongestionSnapshot {
    type Error = congestion_data::TimestampError;

    fn try_from(raw: &RawSnapshot) -> Result<Self, Self::Error> {
        let values = raw
            .values
            .iter()
            .map(|(road_id, value)| (road_id.clone(), value.as_f64()))
            .collect();
        Ok(Self::new(raw.timestamp()?, values))
    }
}

/// The full, immutable congestion time series.
#[derive(Debug, Clone, Default)]
pub struct CongestionIndex {
    snapshots: Vec<CongestionSnapshot>,
    by_time: HashMap<NaiveDateTime, usize>,
}

impl CongestionIndex {
    /// Builds the index from snapshots in source order.
    ///
    /// When two snapshots share a timestamp, the first one wins.
    pub fn from_snapshots<I: IntoIterator<Item = CongestionSnapshot>>(snapshots: I) -> Self {
        let mut index = Self::default();
        for snapshot in snapshots {
            match index.by_time.entry(snapshot.timestamp) {
                Entry::Occupied(_) => {
                    warn!(
                        timestamp = %format_timestamp(&snapshot.timestamp),
                        "Ignoring duplicate congestion snapshot"
                    );
                }
                Entry::Vacant(slot) => {
                    slot.insert(index.snapshots.len());
                    index.snapshots.push(snapshot);
                }
            }
        }

        debug!(count = index.snapshots.len(), "Built congestion index");
        index
    }

    /// Builds the index from raw source records, normalizing their timestamps.
    ///
    /// Records with an unreadable timestamp are skipped with a warning.
    pub fn from_raw<'a, I: IntoIterator<Item = &'a RawSnapshot>>(raw: I) -> Self {
        Self::from_snapshots(raw.into_iter().filter_map(|record| {
            CongestionSnapshot::try_from(record)
                .inspect_err(|error| warn!(%error, "Skipping congestion snapshot"))
                .ok()
        }))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Sampling instants, in source order.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.snapshots.iter().map(CongestionSnapshot::timestamp)
    }

    /// The earliest and latest sampling instants.
    pub fn coverage(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self.timestamps().minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(only) => Some((only, only)),
            MinMaxResult::MinMax(first, last) => Some((first, last)),
        }
    }

    /// Finds the snapshot for the minute containing `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CongestionError::NoSnapshotForTime`] if there was no sample at that minute.
    /// Callers should leave existing styling alone in that case.
    pub fn snapshot_at(&self, time: NaiveDateTime) -> Result<&CongestionSnapshot, CongestionError> {
        let minute = truncate_to_minute(time);
        self.by_time
            .get(&minute)
            .map(|&i| &self.snapshots[i])
            .ok_or_else(|| CongestionError::NoSnapshotForTime(format_timestamp(&minute)))
    }

    /// Classifies a road at the given time.
    ///
    /// # Errors
    ///
    /// See [`CongestionIndex::snapshot_at`].
    pub fn classify(
        &self,
        road_id: &str,
        time: NaiveDateTime,
    ) -> Result<Classification, CongestionError> {
        Ok(self.snapshot_at(time)?.classify(road_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use congestion_data::parse_timestamp;

    fn at(ts: &str) -> NaiveDateTime {
        parse_timestamp(ts).expect("valid test timestamp")
    }

    fn raw(json: &str) -> Vec<RawSnapshot> {
        serde_json::from_str(json).expect("valid test snapshots")
    }

    fn sample_index() -> CongestionIndex {
        CongestionIndex::from_raw(&raw(
            r#"[
                {"ts": "2019/9/1 0:00", "a": "1.5", "b": "3.9", "c": "4.0", "d": "7.2", "e": "oops", "137": "9.9"},
                {"ts": "2019/9/1 0:10", "a": "2.0", "b": "5.999", "c": "6.0"}
            ]"#,
        ))
    }

    #[test]
    fn classification_bands() {
        let index = sample_index();
        let t = at("2019-09-01 00:00");

        let expect = |road: &str, severity: Severity, color: Color| {
            let classification = index.classify(road, t).expect("snapshot exists");
            let drawn = classification.color(ColorContext::Drawing);
            assert_eq!(classification.severity, severity, "road {road}");
            assert_eq!(drawn, color, "road {road}");
        };

        expect("a", Severity::FreeFlowing, FREE_FLOWING_COLOR);
        expect("b", Severity::Light, LIGHT_COLOR);
        expect("c", Severity::Moderate, MODERATE_COLOR);
        expect("d", Severity::Severe, SEVERE_COLOR);
    }

    #[test]
    fn band_lower_bounds_are_inclusive() {
        let index = sample_index();
        let t = at("2019-09-01 00:10");
        let severity = |road: &str| index.classify(road, t).map(|c| c.severity);
        assert_eq!(severity("a"), Ok(Severity::Light));
        assert_eq!(severity("b"), Ok(Severity::Moderate));
        assert_eq!(severity("c"), Ok(Severity::Severe));
    }

    #[test]
    fn unknown_values_differ_by_context() {
        let index = sample_index();
        let t = at("2019-09-01 00:00");

        for road in ["e", "missing"] {
            let classification = index.classify(road, t).expect("snapshot exists");
            assert_eq!(classification.severity, Severity::Unknown);
            assert_eq!(classification.index, None);
            assert_eq!(classification.color(ColorContext::Drawing), SEVERE_COLOR);
            let panel = classification.color(ColorContext::DetailPanel);
            assert_eq!(panel, NO_DATA_COLOR);
            assert_eq!(classification.label(ColorContext::DetailPanel), "No data");
        }
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let index = sample_index();
        assert_eq!(
            index.classify("a", at("2019-09-01 00:05")),
            Err(CongestionError::NoSnapshotForTime("2019-09-01 00:05".into()))
        );
    }

    #[test]
    fn lookup_truncates_to_the_minute() {
        let index = sample_index();
        let classification = index
            .classify("a", at("2019-09-01 00:10:45"))
            .expect("same minute as a snapshot");
        assert_eq!(classification.index, Some(2.0));
    }

    #[test]
    fn first_duplicate_wins_and_bad_timestamps_are_skipped() {
        let index = CongestionIndex::from_raw(&raw(
            r#"[
                {"ts": "2019/9/1 0:00", "a": "1.0"},
                {"ts": "not a time", "a": "2.0"},
                {"ts": "2019-09-01 00:00", "a": "8.0"}
            ]"#,
        ));
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.classify("a", at("2019-09-01 00:00")).map(|c| c.index),
            Ok(Some(1.0))
        );
    }

    #[test]
    fn coverage_spans_all_snapshots() {
        let index = sample_index();
        assert_eq!(
            index.coverage(),
            Some((at("2019-09-01 00:00"), at("2019-09-01 00:10")))
        );
        assert_eq!(CongestionIndex::default().coverage(), None);
    }
}
