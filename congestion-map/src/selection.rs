//! # Selection state
//!
//! The time cursor plus the selected and hovered roads.

use crate::catalog::RoadId;
use chrono::NaiveDateTime;
use congestion_data::timestamp::truncate_to_minute;

/// What the user is currently looking at.
///
/// Read whenever a style is computed, so that changing the time
/// after segments are drawn never leaves a stale value behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    selected_road: Option<RoadId>,
    hovered_road: Option<RoadId>,
    selected_time: NaiveDateTime,
}

impl SelectionState {
    pub fn new(selected_time: NaiveDateTime) -> Self {
        Self {
            selected_road: None,
            hovered_road: None,
            selected_time: truncate_to_minute(selected_time),
        }
    }

    pub fn selected_road(&self) -> Option<&RoadId> {
        self.selected_road.as_ref()
    }

    pub fn hovered_road(&self) -> Option<&RoadId> {
        self.hovered_road.as_ref()
    }

    pub fn selected_time(&self) -> NaiveDateTime {
        self.selected_time
    }

    pub fn is_selected(&self, road_id: &RoadId) -> bool {
        self.selected_road.as_ref() == Some(road_id)
    }

    pub fn select_road(&mut self, road_id: RoadId) {
        self.selected_road = Some(road_id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_road = None;
    }

    pub fn set_hovered(&mut self, road_id: Option<RoadId>) {
        self.hovered_road = road_id;
    }

    /// Sets the time cursor, truncated to the minute.
    pub fn set_time(&mut self, time: NaiveDateTime) {
        self.selected_time = truncate_to_minute(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;

    #[test]
    fn time_is_truncated_to_the_minute() {
        let mut selection = SelectionState::new(at("2019-09-01 00:00"));
        let with_seconds = at("2019-09-01 08:10") + chrono::TimeDelta::seconds(42);
        selection.set_time(with_seconds);
        assert_eq!(selection.selected_time(), at("2019-09-01 08:10"));
    }

    #[test]
    fn road_selection() {
        let mut selection = SelectionState::new(at("2019-09-01 00:00"));
        let road = RoadId::new("1000137");
        assert!(!selection.is_selected(&road));

        selection.select_road(road.clone());
        assert!(selection.is_selected(&road));
        assert!(!selection.is_selected(&RoadId::new("1001143")));

        selection.clear_selection();
        assert_eq!(selection.selected_road(), None);
    }
}
