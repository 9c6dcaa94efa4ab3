//! # Well-known-text road geometry
//!
//! Road exports describe their shape as WKT.
//! Only the two line variants are supported:
//!
//! ```text
//! LINESTRING(116.48 39.99, 116.49 39.99)
//! MULTILINESTRING((116.48 39.99, 116.49 39.99), (116.49 39.99, 116.50 40.00))
//! ```
//!
//! The text is untrusted, so every coordinate is checked for numeric-ness
//! and membership in the service [`Region`].
//! Duplicate points are removed (keeping the first occurrence),
//! and any line with fewer than two points left over is rejected.

use geo::{Coord, LineString};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::{debug, warn};
use wkt::TryFromWkt;

/// The longest slice of offending input echoed back in error messages.
const MAX_ECHO_CHARS: usize = 64;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    #[error("Malformed geometry (expected TYPE(...)): {0}")]
    MalformedGeometry(String),
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),
    #[error("Invalid coordinate {token:?}: {problem}")]
    InvalidCoordinate {
        token: String,
        problem: CoordinateProblem,
    },
    #[error("A line needs at least 2 distinct points; found {found}")]
    InsufficientPoints { found: usize },
    #[error("None of the line string parts were usable")]
    NoValidParts,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CoordinateProblem {
    #[error("expected two finite numbers")]
    NotNumeric,
    #[error("outside the service region")]
    OutOfRegion,
}

/// An inclusive longitude/latitude bounding region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Mainland China, which is where all road data comes from.
pub const DEFAULT_REGION: Region = Region {
    min_lng: 73.0,
    max_lng: 135.0,
    min_lat: 18.0,
    max_lat: 53.0,
};

impl Region {
    /// Returns true if the coordinate lies within the region (edges included).
    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        (self.min_lng..=self.max_lng).contains(&coord.x)
            && (self.min_lat..=self.max_lat).contains(&coord.y)
    }
}

impl Default for Region {
    fn default() -> Self {
        DEFAULT_REGION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    LineString,
    MultiLineString,
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryKind::LineString => write!(f, "LINESTRING"),
            GeometryKind::MultiLineString => write!(f, "MULTILINESTRING"),
        }
    }
}

/// A parsed road shape.
///
/// Every part holds at least 2 distinct, in-region points,
/// and there is always at least one part.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    kind: GeometryKind,
    parts: Vec<LineString>,
}

impl RoadGeometry {
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// All surviving parts, in source order. Each one is drawn as its own segment.
    pub fn parts(&self) -> &[LineString] {
        &self.parts
    }

    /// The first surviving part, used for summaries.
    pub fn primary(&self) -> &LineString {
        // Parsing never produces an empty part list
        &self.parts[0]
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Total number of points across all parts.
    pub fn point_count(&self) -> usize {
        self.parts.iter().map(|part| part.0.len()).sum()
    }
}

/// Parses WKT road geometry, validating coordinates against a [`Region`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryParser {
    region: Region,
}

impl GeometryParser {
    pub fn new(region: Region) -> Self {
        Self { region }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Parses a `LINESTRING` or `MULTILINESTRING`.
    ///
    /// The type tag is matched case-insensitively.
    /// Coordinate lists are read with the `wkt` crate, one line string at a time.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::MalformedGeometry`] if the text is not shaped like `TYPE(...)`
    /// - [`GeometryError::UnsupportedGeometryType`] for any other type tag
    /// - [`GeometryError::InvalidCoordinate`] for a non-numeric or out-of-region point
    ///   in a line string
    /// - [`GeometryError::InsufficientPoints`] if a line string has fewer than 2 points,
    ///   before or after removing duplicates
    /// - [`GeometryError::NoValidParts`] if every part of a multi line string was skipped
    ///
    /// Invalid parts of a multi line string are skipped with a warning rather than failing.
    pub fn parse(&self, wkt: &str) -> Result<RoadGeometry, GeometryError> {
        let (kind, body) = split_tagged(wkt)?;
        let parts = match kind {
            GeometryKind::LineString => vec![self.parse_line_string(body)?],
            GeometryKind::MultiLineString => self.parse_multi_line_string(body)?,
        };

        Ok(RoadGeometry { kind, parts })
    }

    fn parse_line_string(&self, body: &str) -> Result<LineString, GeometryError> {
        let not_numeric = || GeometryError::InvalidCoordinate {
            token: echo(body.trim()),
            problem: CoordinateProblem::NotNumeric,
        };
        // Nested groups and empty bodies aren't a single line string
        if body.trim().is_empty() || body.contains(['(', ')']) {
            return Err(not_numeric());
        }

        let line = LineString::<f64>::try_from_wkt_str(&format!("LINESTRING({body})"))
            .map_err(|error| {
                debug!(%error, "Unreadable line string");
                not_numeric()
            })?;
        let points = line.into_inner();
        for &point in &points {
            self.check_point(point)?;
        }
        if points.len() < 2 {
            return Err(GeometryError::InsufficientPoints {
                found: points.len(),
            });
        }

        let unique = dedup_points(points);
        if unique.len() < 2 {
            return Err(GeometryError::InsufficientPoints {
                found: unique.len(),
            });
        }

        Ok(LineString::new(unique))
    }

    fn parse_multi_line_string(&self, body: &str) -> Result<Vec<LineString>, GeometryError> {
        let parts: Vec<LineString> = split_parts(body)?
            .into_iter()
            .enumerate()
            .filter_map(|(index, part)| match self.parse_line_string(part) {
                Ok(line) => Some(line),
                Err(error) => {
                    warn!(part = index + 1, %error, "Skipping unusable line string part");
                    None
                }
            })
            .collect();

        if parts.is_empty() {
            Err(GeometryError::NoValidParts)
        } else {
            Ok(parts)
        }
    }

    fn check_point(&self, point: Coord) -> Result<(), GeometryError> {
        let problem = if !point.x.is_finite() || !point.y.is_finite() {
            CoordinateProblem::NotNumeric
        } else if self.region.contains(point) {
            return Ok(());
        } else {
            CoordinateProblem::OutOfRegion
        };

        Err(GeometryError::InvalidCoordinate {
            token: format!("{} {}", point.x, point.y),
            problem,
        })
    }
}

/// Splits `TYPE(body)` into a kind and the text between the outer parentheses.
fn split_tagged(wkt: &str) -> Result<(GeometryKind, &str), GeometryError> {
    let trimmed = wkt.trim();
    let malformed = || GeometryError::MalformedGeometry(echo(trimmed));

    let open = trimmed.find('(').ok_or_else(malformed)?;
    let tag = trimmed[..open].trim_end();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(malformed());
    }
    let body = trimmed[open + 1..].strip_suffix(')').ok_or_else(malformed)?;

    let kind = if tag.eq_ignore_ascii_case("LINESTRING") {
        GeometryKind::LineString
    } else if tag.eq_ignore_ascii_case("MULTILINESTRING") {
        GeometryKind::MultiLineString
    } else {
        return Err(GeometryError::UnsupportedGeometryType(tag.to_string()));
    };

    Ok((kind, body))
}

/// Recovers the per-part bodies of a multi line string.
///
/// Parts are the top-level `(...)` groups; separators between them may carry whitespace.
/// A body with no parenthesized groups at all is treated as a single part.
fn split_parts(body: &str) -> Result<Vec<&str>, GeometryError> {
    if !body.trim_start().starts_with('(') {
        return Ok(vec![body]);
    }

    let malformed = || GeometryError::MalformedGeometry(echo(body));
    let mut parts = Vec::new();
    let mut open_at = None;
    for (i, c) in body.char_indices() {
        match (c, open_at) {
            ('(', None) => open_at = Some(i + 1),
            (')', Some(start)) => {
                parts.push(&body[start..i]);
                open_at = None;
            }
            ('(' | ')', _) => return Err(malformed()),
            (',', None) => {}
            (c, None) if !c.is_whitespace() => return Err(malformed()),
            _ => {}
        }
    }

    if open_at.is_some() {
        return Err(malformed());
    }
    Ok(parts)
}

/// Removes duplicate points anywhere in the sequence, keeping first occurrences in order.
fn dedup_points(points: Vec<Coord>) -> Vec<Coord> {
    points
        .into_iter()
        .unique_by(|point| (point.x.to_bits(), point.y.to_bits()))
        .collect()
}

fn echo(input: &str) -> String {
    input.chars().take(MAX_ECHO_CHARS).collect()
}
