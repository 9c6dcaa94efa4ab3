//! # Pointer interaction
//!
//! Hover highlighting and click-to-inspect for individual segments.
//! Everything is computed from the [`SelectionState`] at the moment the event arrives.

use crate::catalog::SegmentKey;
use crate::congestion::Classification;
use crate::detail::DetailView;
use crate::scheduler::{Emphasis, Lookup, StyleScheduler, baseline_style};
use crate::selection::SelectionState;
use crate::style::{Color, DEFAULT_HOVER_COLOR, SegmentStyle};
use crate::widget::{MapWidget, SegmentEvent};
use geo::Coord;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionController {
    hover_color: Color,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_COLOR)
    }
}

impl InteractionController {
    pub fn new(hover_color: Color) -> Self {
        Self { hover_color }
    }

    pub fn hover_color(&self) -> Color {
        self.hover_color
    }

    /// Routes a widget event. Returns the detail view for clicks.
    pub fn handle<W: MapWidget>(
        &self,
        event: &SegmentEvent,
        lookup: Lookup<'_>,
        selection: &mut SelectionState,
        scheduler: &mut StyleScheduler<W::Handle>,
        widget: &mut W,
    ) -> Option<DetailView> {
        match event {
            SegmentEvent::PointerEnter(key) => {
                self.pointer_enter(key, selection, scheduler, widget);
                None
            }
            SegmentEvent::PointerLeave(key) => {
                self.pointer_leave(key, lookup, selection, scheduler, widget);
                None
            }
            SegmentEvent::Click { key, at } => self.click(key, *at, lookup, selection, widget),
        }
    }

    pub fn pointer_enter<W: MapWidget>(
        &self,
        key: &SegmentKey,
        selection: &mut SelectionState,
        scheduler: &mut StyleScheduler<W::Handle>,
        widget: &mut W,
    ) {
        let style = SegmentStyle::hover(self.hover_color);
        if scheduler.apply_one(key, style, Emphasis::Hovered, widget) {
            selection.set_hovered(Some(key.road_id().clone()));
        }
    }

    /// Restores the segment's congestion style for the current time.
    ///
    /// The road stays hovered while another of its parts is still emphasized.
    pub fn pointer_leave<W: MapWidget>(
        &self,
        key: &SegmentKey,
        lookup: Lookup<'_>,
        selection: &mut SelectionState,
        scheduler: &mut StyleScheduler<W::Handle>,
        widget: &mut W,
    ) {
        let style = baseline_style(key.road_id(), lookup.congestion, selection);
        scheduler.apply_one(key, style, Emphasis::None, widget);
        let road_id = key.road_id();
        if selection.hovered_road() == Some(road_id) && !scheduler.is_road_emphasized(road_id) {
            selection.set_hovered(None);
        }
    }

    /// Selects the clicked road and opens its detail popup.
    ///
    /// The new selection shows up as heavier strokes on the next restyle.
    pub fn click<W: MapWidget>(
        &self,
        key: &SegmentKey,
        at: Coord,
        lookup: Lookup<'_>,
        selection: &mut SelectionState,
        widget: &mut W,
    ) -> Option<DetailView> {
        let Some(road) = lookup.catalog.get(key.road_id().as_str()) else {
            warn!(segment = %key, "Click on a segment with no road");
            return None;
        };

        let time = selection.selected_time();
        let classification = lookup
            .congestion
            .classify(road.id().as_str(), time)
            .inspect_err(|error| debug!(%error, "Showing road without congestion data"))
            .unwrap_or_else(|_| Classification::unknown());
        let view = DetailView::new(road, time, &classification);

        widget.open_popup(at, &view.to_html());
        selection.select_road(road.id().clone());
        info!(road_id = %road.id(), name = %road.name(), "Selected road");

        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RoadCatalog, RoadId};
    use crate::config::BatchSize;
    use crate::congestion::{CongestionIndex, MODERATE_COLOR, SEVERE_COLOR};
    use crate::style::{BASE_WEIGHT, EMPHASIS_WEIGHT, HOVER_OPACITY};
    use crate::test_support::{at, sample_catalog, sample_index};
    use crate::widget::testing::{RecordingWidget, WidgetCall};
    use geo::coord;

    struct Fixture {
        catalog: RoadCatalog,
        congestion: CongestionIndex,
        selection: SelectionState,
        widget: RecordingWidget,
        scheduler: StyleScheduler<usize>,
        controller: InteractionController,
    }

    impl Fixture {
        fn new() -> Self {
            let batch = BatchSize::try_new(50).expect("non-zero batch size");
            let mut fixture = Self {
                catalog: sample_catalog(),
                congestion: sample_index(),
                selection: SelectionState::new(at("2019-09-01 00:00")),
                widget: RecordingWidget::default(),
                scheduler: StyleScheduler::new(batch, batch),
                controller: InteractionController::default(),
            };
            fixture
                .scheduler
                .begin_draw(&fixture.catalog, &mut fixture.widget);
            let lookup = Lookup {
                catalog: &fixture.catalog,
                congestion: &fixture.congestion,
            };
            fixture
                .scheduler
                .run_until_idle(lookup, &fixture.selection, &mut fixture.widget);
            fixture.widget.clear_calls();
            fixture
        }

        fn send(&mut self, event: SegmentEvent) -> Option<DetailView> {
            let lookup = Lookup {
                catalog: &self.catalog,
                congestion: &self.congestion,
            };
            self.controller.handle(
                &event,
                lookup,
                &mut self.selection,
                &mut self.scheduler,
                &mut self.widget,
            )
        }
    }

    fn key(s: &str) -> SegmentKey {
        s.parse().expect("valid segment key")
    }

    #[test]
    fn hover_then_leave_restores_baseline() {
        let mut fixture = Fixture::new();
        let hovered = key("1001143-1");

        fixture.send(SegmentEvent::PointerEnter(hovered.clone()));
        let style = *fixture.scheduler.style_of(&hovered).expect("drawn");
        assert_eq!(style.color, DEFAULT_HOVER_COLOR);
        assert_eq!(style.weight, EMPHASIS_WEIGHT);
        assert!((style.opacity - HOVER_OPACITY).abs() < f32::EPSILON);
        assert_eq!(
            fixture.selection.hovered_road().map(RoadId::as_str),
            Some("1001143")
        );
        // Only the hovered part changes
        let sibling = fixture.scheduler.style_of(&key("1001143-0"));
        assert_ne!(sibling.map(|s| s.color), Some(DEFAULT_HOVER_COLOR));

        fixture.send(SegmentEvent::PointerLeave(hovered.clone()));
        let style = *fixture.scheduler.style_of(&hovered).expect("drawn");
        assert_eq!(style.color, MODERATE_COLOR);
        assert_eq!(style.weight, BASE_WEIGHT);
        let segment = fixture.scheduler.segment(&hovered).expect("drawn");
        assert!(!segment.is_emphasized());
        assert_eq!(fixture.selection.hovered_road(), None);
    }

    #[test]
    fn road_stays_hovered_until_its_last_part_is_left() {
        let mut fixture = Fixture::new();
        let road = RoadId::new("1001143");
        fixture.send(SegmentEvent::PointerEnter(key("1001143-0")));
        fixture.send(SegmentEvent::PointerEnter(key("1001143-1")));

        fixture.send(SegmentEvent::PointerLeave(key("1001143-0")));
        assert_eq!(
            fixture.selection.hovered_road().map(RoadId::as_str),
            Some("1001143")
        );
        assert!(fixture.scheduler.is_road_emphasized(&road));

        fixture.send(SegmentEvent::PointerLeave(key("1001143-1")));
        assert_eq!(fixture.selection.hovered_road(), None);
        assert!(!fixture.scheduler.is_road_emphasized(&road));
    }

    #[test]
    fn leave_uses_time_at_event() {
        let mut fixture = Fixture::new();
        let hovered = key("1000137-0");
        fixture.send(SegmentEvent::PointerEnter(hovered.clone()));

        // 1000137 is 6.1 at 00:20
        fixture.selection.set_time(at("2019-09-01 00:20"));
        fixture.send(SegmentEvent::PointerLeave(hovered.clone()));
        assert_eq!(
            fixture.scheduler.style_of(&hovered).map(|s| s.color),
            Some(SEVERE_COLOR)
        );
    }

    #[test]
    fn leave_without_snapshot_falls_back_to_unknown() {
        let mut fixture = Fixture::new();
        let hovered = key("1000137-0");
        fixture.send(SegmentEvent::PointerEnter(hovered.clone()));
        fixture.selection.set_time(at("2019-09-01 00:05"));
        fixture.send(SegmentEvent::PointerLeave(hovered.clone()));
        assert_eq!(
            fixture.scheduler.style_of(&hovered).map(|s| s.color),
            Some(SEVERE_COLOR)
        );
    }

    #[test]
    fn click_selects_and_opens_popup() {
        let mut fixture = Fixture::new();
        let view = fixture
            .send(SegmentEvent::Click {
                key: key("1001143-0"),
                at: coord! { x: 116.4, y: 39.9 },
            })
            .expect("known road");

        assert_eq!(view.road_id, "1001143");
        assert_eq!(view.status_label, "Moderate congestion");
        assert_eq!(view.index_text.as_deref(), Some("4.0"));
        assert_eq!(
            fixture.selection.selected_road().map(RoadId::as_str),
            Some("1001143")
        );

        assert!(matches!(
            fixture.widget.calls.last(),
            Some(WidgetCall::Popup { at, .. }) if *at == coord! { x: 116.4, y: 39.9 }
        ));
        let popups = fixture.widget.popups();
        assert_eq!(popups.len(), 1);
        assert!(popups[0].contains("Jingmi Road"));
    }

    #[test]
    fn events_for_unknown_segments_are_ignored() {
        let mut fixture = Fixture::new();
        let ghost = key("999-0");
        fixture.send(SegmentEvent::PointerEnter(ghost.clone()));
        assert_eq!(fixture.selection.hovered_road(), None);

        let view = fixture.send(SegmentEvent::Click {
            key: ghost,
            at: coord! { x: 116.4, y: 39.9 },
        });
        assert_eq!(view, None);
        assert!(fixture.widget.calls.is_empty());
    }
}
