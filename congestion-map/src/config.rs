//! # View configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::diagnostics;
use crate::geometry::Region;
use crate::picker::CampaignWindow;
use crate::style::{Color, DEFAULT_HOVER_COLOR};
use chrono::NaiveDateTime;
use congestion_data::{format_timestamp, parse_timestamp};
use nutype::nutype;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// How many items a scheduler processes per frame. Must be non-zero.
#[nutype(
    const_fn,
    derive(Copy, Clone, Eq, PartialEq, Debug, Display, Serialize, Deserialize),
    validate(greater = 0)
)]
pub struct BatchSize(usize);

pub const DEFAULT_DRAW_BATCH: usize = 20;
pub const DEFAULT_RESTYLE_BATCH: usize = 50;
pub const DEFAULT_INITIAL_TIME: &str = "2019-09-01 00:00";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Coordinates outside this region are rejected by the geometry parser.
    pub region: Region,
    /// Roads drawn per frame during the initial draw pass.
    pub draw_batch: BatchSize,
    /// Segments restyled per frame.
    pub restyle_batch: BatchSize,
    /// Entries kept by the session's [`DiagnosticLog`](crate::DiagnosticLog).
    pub diagnostics_capacity: usize,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub initial_time: NaiveDateTime,
    pub campaign: CampaignWindow,
    pub hover_color: Color,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            // The defaults are non-zero, so these can't fail
            draw_batch: BatchSize::try_new(DEFAULT_DRAW_BATCH).expect("non-zero batch size"),
            restyle_batch: BatchSize::try_new(DEFAULT_RESTYLE_BATCH).expect("non-zero batch size"),
            diagnostics_capacity: diagnostics::DEFAULT_CAPACITY,
            initial_time: parse_timestamp(DEFAULT_INITIAL_TIME).expect("valid default timestamp"),
            campaign: CampaignWindow::default(),
            hover_color: DEFAULT_HOVER_COLOR,
        }
    }
}

impl ViewConfig {
    /// # Errors
    ///
    /// Fails on malformed JSON or out-of-range values (such as a zero batch size).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// See [`ViewConfig::from_json_str`]; also fails if the file can't be opened.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn serialize_timestamp<S: Serializer>(
    time: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(time))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
