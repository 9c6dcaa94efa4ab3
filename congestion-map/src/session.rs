//! # Map session
//!
//! Owns everything one congestion map view needs and exposes the operations
//! a front end drives: start drawing, pump frames, move the time cursor,
//! forward pointer events, and rebuild or tear down.

use crate::catalog::RoadCatalog;
use crate::config::ViewConfig;
use crate::congestion::{CongestionError, CongestionIndex};
use crate::detail::DetailView;
use crate::diagnostics::DiagnosticLog;
use crate::geometry::GeometryParser;
use crate::interaction::InteractionController;
use crate::picker::PickerConstraints;
use crate::scheduler::{Epoch, FrameOutcome, Lookup, StyleScheduler};
use crate::selection::SelectionState;
use crate::widget::{MapWidget, SegmentEvent, WidgetError};
use chrono::NaiveDateTime;
use congestion_data::{RawRoad, format_timestamp};
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct Session<W: MapWidget> {
    config: ViewConfig,
    parser: GeometryParser,
    catalog: RoadCatalog,
    congestion: CongestionIndex,
    selection: SelectionState,
    scheduler: StyleScheduler<W::Handle>,
    controller: InteractionController,
    diagnostics: DiagnosticLog,
    widget: W,
}

impl<W: MapWidget> Session<W> {
    /// Builds the road catalog and checks that the widget can draw.
    ///
    /// Nothing is drawn until [`Session::start`].
    /// The session's [`DiagnosticLog`] only records once a front end installs it,
    /// typically with [`DiagnosticLog::try_init`] before creating the session.
    ///
    /// # Errors
    ///
    /// Returns the widget's error if it isn't ready. No drawing can happen in that case,
    /// so the front end should show it to the user.
    pub fn new<I: IntoIterator<Item = RawRoad>>(
        config: ViewConfig,
        raw_roads: I,
        congestion: CongestionIndex,
        widget: W,
    ) -> Result<Self, WidgetError> {
        widget
            .ready()
            .inspect_err(|error| error!(%error, "Map widget is not usable"))?;

        let parser = GeometryParser::new(config.region);
        let catalog = RoadCatalog::build(raw_roads, &parser);
        info!(
            roads = catalog.len(),
            snapshots = congestion.len(),
            time = %format_timestamp(&config.initial_time),
            "Session ready"
        );

        Ok(Self {
            selection: SelectionState::new(config.initial_time),
            scheduler: StyleScheduler::new(config.draw_batch, config.restyle_batch),
            controller: InteractionController::new(config.hover_color),
            diagnostics: DiagnosticLog::new(config.diagnostics_capacity),
            config,
            parser,
            catalog,
            congestion,
            widget,
        })
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RoadCatalog {
        &self.catalog
    }

    pub fn congestion(&self) -> &CongestionIndex {
        &self.congestion
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn scheduler(&self) -> &StyleScheduler<W::Handle> {
        &self.scheduler
    }

    /// Recent log events for an on-screen panel, sized by the config.
    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Picker predicates for the configured campaign and the loaded data.
    pub fn picker_constraints(&self) -> PickerConstraints {
        self.config.campaign.constraints(self.congestion.coverage())
    }

    /// Schedules the initial draw pass.
    pub fn start(&mut self) {
        self.scheduler.begin_draw(&self.catalog, &mut self.widget);
    }

    /// One cooperative step. Call once per frame.
    pub fn run_frame(&mut self) -> FrameOutcome {
        let lookup = Lookup {
            catalog: &self.catalog,
            congestion: &self.congestion,
        };
        self.scheduler
            .run_frame(lookup, &self.selection, &mut self.widget)
    }

    /// Runs frames until no live work remains. Returns how many did work.
    pub fn run_until_idle(&mut self) -> usize {
        let lookup = Lookup {
            catalog: &self.catalog,
            congestion: &self.congestion,
        };
        self.scheduler
            .run_until_idle(lookup, &self.selection, &mut self.widget)
    }

    /// Moves the time cursor and schedules a restyle.
    ///
    /// # Errors
    ///
    /// [`CongestionError::NoSnapshotForTime`] when there's no data for `time`.
    /// The cursor still moves, but drawn styles are left as they were.
    pub fn select_time(&mut self, time: NaiveDateTime) -> Result<Epoch, CongestionError> {
        self.selection.set_time(time);
        self.scheduler
            .apply_all(self.selection.selected_time(), &self.congestion)
            .inspect_err(|error| warn!(%error, "Keeping current styles"))
    }

    /// Forwards a pointer event. Returns the detail view for clicks.
    pub fn handle_event(&mut self, event: &SegmentEvent) -> Option<DetailView> {
        let lookup = Lookup {
            catalog: &self.catalog,
            congestion: &self.congestion,
        };
        self.controller.handle(
            event,
            lookup,
            &mut self.selection,
            &mut self.scheduler,
            &mut self.widget,
        )
    }

    /// Replaces the road set and redraws it from scratch.
    ///
    /// The road selection is kept only if that road still exists.
    pub fn rebuild<I: IntoIterator<Item = RawRoad>>(&mut self, raw_roads: I) {
        self.teardown();
        self.catalog = RoadCatalog::build(raw_roads, &self.parser);
        let selection_gone = self
            .selection
            .selected_road()
            .is_some_and(|road_id| self.catalog.get(road_id.as_str()).is_none());
        if selection_gone {
            self.selection.clear_selection();
        }
        self.start();
    }

    /// Cancels pending work and removes every drawn line.
    pub fn teardown(&mut self) {
        self.scheduler.teardown(&mut self.widget);
        self.selection.set_hovered(None);
    }
}
