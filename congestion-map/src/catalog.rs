//! # Road catalog
//!
//! The set of drawable roads, built once from raw source records.
//! Records whose geometry can't be parsed are dropped here (with a warning)
//! so that nothing downstream ever sees an unusable road.

use crate::geometry::{GeometryError, GeometryParser, RoadGeometry};
use congestion_data::RawRoad;
use geo::LineString;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// The canonical road identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoadId(String);

impl RoadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RoadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoadId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoadId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifies one drawn segment: a single part of a road's geometry.
///
/// Renders as `{road_id}-{part_index}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    road_id: RoadId,
    part_index: usize,
}

impl SegmentKey {
    pub fn new(road_id: RoadId, part_index: usize) -> Self {
        Self {
            road_id,
            part_index,
        }
    }

    pub fn road_id(&self) -> &RoadId {
        &self.road_id
    }

    pub fn part_index(&self) -> usize {
        self.part_index
    }
}

impl Display for SegmentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.road_id, self.part_index)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentKeyError {
    #[error("Segment key is missing the '-' separator")]
    MissingSeparator,
    #[error("Invalid part index: {0}")]
    PartIndex(#[from] ParseIntError),
}

impl FromStr for SegmentKey {
    type Err = SegmentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the last dash so that road IDs may contain dashes themselves
        let (road_id, part_index) = s.rsplit_once('-').ok_or(SegmentKeyError::MissingSeparator)?;
        Ok(Self::new(RoadId::new(road_id), part_index.parse()?))
    }
}

/// A validated, drawable road. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    id: RoadId,
    name: String,
    direction: String,
    from_name: Option<String>,
    to_name: Option<String>,
    length_m: f64,
    geometry: RoadGeometry,
}

impl Road {
    fn new(raw: RawRoad, geometry: RoadGeometry) -> Self {
        let non_blank = |name: Option<String>| name.filter(|n| !n.trim().is_empty());
        Self {
            id: RoadId::new(raw.id),
            name: raw.name,
            direction: raw.direction,
            from_name: non_blank(raw.from_name),
            to_name: non_blank(raw.to_name),
            length_m: raw.length_m,
            geometry,
        }
    }

    pub fn id(&self) -> &RoadId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    pub fn from_name(&self) -> Option<&str> {
        self.from_name.as_deref()
    }

    pub fn to_name(&self) -> Option<&str> {
        self.to_name.as_deref()
    }

    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    pub fn length_km(&self) -> f64 {
        self.length_m / 1000.0
    }

    pub fn geometry(&self) -> &RoadGeometry {
        &self.geometry
    }

    pub fn segment_count(&self) -> usize {
        self.geometry.part_count()
    }

    pub fn point_count(&self) -> usize {
        self.geometry.point_count()
    }

    /// Each geometry part keyed by its segment key, in part order.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentKey, &LineString)> {
        self.geometry
            .parts()
            .iter()
            .enumerate()
            .map(|(i, part)| (SegmentKey::new(self.id.clone(), i), part))
    }
}

/// Why a raw record didn't make it into the catalog.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Exclusion {
    #[error("Missing geometry")]
    MissingGeometry,
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error("Only {0} usable point(s)")]
    TooFewPoints(usize),
    #[error("Duplicate road ID")]
    DuplicateId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedRoad {
    pub id: String,
    pub name: String,
    pub reason: Exclusion,
}

/// Road counts grouped by `(name, direction)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSummary {
    pub by_name_and_direction: BTreeMap<(String, String), usize>,
    pub total: usize,
}

impl Display for CatalogSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for ((name, direction), count) in &self.by_name_and_direction {
            writeln!(f, "{name}-{direction}: {count}")?;
        }
        write!(f, "total: {}", self.total)
    }
}

/// All drawable roads, in source order.
///
/// Road IDs are unique within a catalog.
#[derive(Debug, Clone, Default)]
pub struct RoadCatalog {
    roads: Vec<Road>,
    by_id: HashMap<RoadId, usize>,
    excluded: Vec<ExcludedRoad>,
}

impl RoadCatalog {
    /// Builds the catalog, parsing each record's geometry.
    ///
    /// This never fails: unusable records are logged and excluded,
    /// and can be inspected later via [`RoadCatalog::excluded`].
    pub fn build<I: IntoIterator<Item = RawRoad>>(raw_roads: I, parser: &GeometryParser) -> Self {
        let mut catalog = Self::default();
        for raw in raw_roads {
            let admitted = {
                let _road = info_span!("road", road_id = %raw.id).entered();
                catalog.admit(&raw, parser)
            };
            match admitted {
                Ok(geometry) => {
                    let road = Road::new(raw, geometry);
                    debug!(
                        road_id = %road.id,
                        name = %road.name,
                        direction = %road.direction,
                        kind = %road.geometry.kind(),
                        primary_points = road.geometry.primary().0.len(),
                        segments = road.segment_count(),
                        "Parsed road"
                    );
                    catalog.by_id.insert(road.id.clone(), catalog.roads.len());
                    catalog.roads.push(road);
                }
                Err(reason) => {
                    warn!(road_id = %raw.id, name = %raw.name, %reason, "Excluding road");
                    catalog.excluded.push(ExcludedRoad {
                        id: raw.id,
                        name: raw.name,
                        reason,
                    });
                }
            }
        }

        let summary = catalog.summary();
        for ((name, direction), count) in &summary.by_name_and_direction {
            debug!(%name, %direction, count, "Roads by name and direction");
        }
        info!(
            roads = summary.total,
            excluded = catalog.excluded.len(),
            "Road catalog built"
        );

        catalog
    }

    /// Checks that a record can join the catalog and parses its geometry.
    fn admit(&self, raw: &RawRoad, parser: &GeometryParser) -> Result<RoadGeometry, Exclusion> {
        if self.by_id.contains_key(raw.id.as_str()) {
            return Err(Exclusion::DuplicateId);
        }
        let wkt = raw.wkt.as_deref().ok_or(Exclusion::MissingGeometry)?;
        let geometry = parser.parse(wkt)?;
        if geometry.point_count() < 2 {
            return Err(Exclusion::TooFewPoints(geometry.point_count()));
        }

        Ok(geometry)
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn get(&self, id: &str) -> Option<&Road> {
        self.by_id.get(id).map(|&i| &self.roads[i])
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Road> {
        self.roads.iter()
    }

    /// Records that were dropped while building, in source order.
    pub fn excluded(&self) -> &[ExcludedRoad] {
        &self.excluded
    }

    /// Total number of drawable segments across all roads.
    pub fn segment_count(&self) -> usize {
        self.roads.iter().map(Road::segment_count).sum()
    }

    pub fn summary(&self) -> CatalogSummary {
        let by_name_and_direction = self
            .roads
            .iter()
            .map(|road| (road.name.clone(), road.direction.clone()))
            .counts()
            .into_iter()
            .collect();

        CatalogSummary {
            by_name_and_direction,
            total: self.roads.len(),
        }
    }
}

impl<'a> IntoIterator for &'a RoadCatalog {
    type Item = &'a Road;
    type IntoIter = std::slice::Iter<'a, Road>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
