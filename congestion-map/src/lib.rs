//! # Congestion map core
//!
//! Turns raw road records and congestion snapshots into styled line segments
//! on an interactive map, independent of any particular map widget.
//!
//! The pipeline: WKT geometry is parsed and validated ([`GeometryParser`]),
//! usable roads are collected into a [`RoadCatalog`], each road part is drawn once
//! as a segment, and whenever the time cursor moves, the [`StyleScheduler`] restyles
//! every segment in small batches using the [`CongestionIndex`].
//! A [`Session`] ties all of this to a concrete [`MapWidget`].

mod catalog;
pub mod config;
mod congestion;
mod detail;
pub mod diagnostics;
mod geometry;
mod interaction;
pub mod picker;
mod scheduler;
mod selection;
mod session;
pub mod style;
mod widget;

pub use catalog::{
    CatalogSummary, ExcludedRoad, Exclusion, Road, RoadCatalog, RoadId, SegmentKey,
    SegmentKeyError,
};
pub use config::{BatchSize, ConfigError, ViewConfig};
pub use congestion::{
    Classification, ColorContext, CongestionError, CongestionIndex, CongestionSnapshot,
    FREE_FLOWING_COLOR, LIGHT_COLOR, MODERATE_COLOR, NO_DATA_COLOR, SEVERE_COLOR, Severity,
};
pub use detail::DetailView;
pub use diagnostics::{DiagnosticEntry, DiagnosticLog};
pub use geometry::{
    CoordinateProblem, DEFAULT_REGION, GeometryError, GeometryKind, GeometryParser, Region,
    RoadGeometry,
};
pub use interaction::InteractionController;
pub use picker::{CampaignWindow, PickerConstraints};
pub use scheduler::{
    DrawProgress, DrawnSegment, Emphasis, Epoch, FrameOutcome, Lookup, StyleScheduler,
    baseline_style,
};
pub use selection::SelectionState;
pub use session::Session;
pub use style::{Color, ColorParseError, SegmentStyle};
pub use widget::{MapWidget, SegmentEvent, WidgetError};
