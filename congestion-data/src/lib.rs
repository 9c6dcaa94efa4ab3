//! # Raw congestion map inputs
//!
//! Data structures for the two source feeds (road records and congestion snapshots),
//! JSON loading helpers, and timestamp normalization.
//! Nothing here knows about geometry or rendering.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

mod road;
mod snapshot;
pub mod timestamp;

pub use road::RawRoad;
pub use snapshot::{RawIndexValue, RawSnapshot};
pub use timestamp::{TimestampError, format_timestamp, normalize_timestamp, parse_timestamp};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] TimestampError),
}

/// Reads a JSON array of road records.
///
/// # Errors
///
/// Fails on malformed JSON or records missing required fields.
/// Geometry is *not* validated here.
pub fn load_roads<R: Read>(reader: R) -> Result<Vec<RawRoad>, DataError> {
    let roads: Vec<RawRoad> = serde_json::from_reader(reader)?;
    debug!(count = roads.len(), "Loaded raw road records");
    Ok(roads)
}

/// Reads a JSON array of road records from a file.
///
/// # Errors
///
/// See [`load_roads`]; also fails if the file can't be opened.
pub fn load_roads_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRoad>, DataError> {
    load_roads(BufReader::new(File::open(path)?))
}

/// Reads a JSON array of congestion snapshots, in source order.
///
/// # Errors
///
/// Fails on malformed JSON. Timestamps are normalized later, when the index is built.
pub fn load_snapshots<R: Read>(reader: R) -> Result<Vec<RawSnapshot>, DataError> {
    let snapshots: Vec<RawSnapshot> = serde_json::from_reader(reader)?;
    debug!(count = snapshots.len(), "Loaded raw congestion snapshots");
    Ok(snapshots)
}

/// Reads a JSON array of congestion snapshots from a file.
///
/// # Errors
///
/// See [`load_snapshots`]; also fails if the file can't be opened.
pub fn load_snapshots_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawSnapshot>, DataError> {
    load_snapshots(BufReader::new(File::open(path)?))
}
