//! # Time picker constraints
//!
//! Predicates handed to the external date/time picker so that users can only pick
//! instants inside the data collection campaign.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// Granularity of the picker's minute column.
pub const DEFAULT_MINUTE_STEP: u32 = 10;

/// The inclusive range of selectable days.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignWindow {
    #[serde_as(as = "DisplayFromStr")]
    pub first_day: NaiveDate,
    #[serde_as(as = "DisplayFromStr")]
    pub last_day: NaiveDate,
    #[serde(default = "default_minute_step")]
    pub minute_step: u32,
}

fn default_minute_step() -> u32 {
    DEFAULT_MINUTE_STEP
}

impl Default for CampaignWindow {
    /// September 2019.
    fn default() -> Self {
        Self {
            // Both dates are statically valid
            first_day: NaiveDate::from_ymd_opt(2019, 9, 1).expect("valid date"),
            last_day: NaiveDate::from_ymd_opt(2019, 9, 30).expect("valid date"),
            minute_step: DEFAULT_MINUTE_STEP,
        }
    }
}

impl CampaignWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.first_day..=self.last_day).contains(&date)
    }

    pub fn is_date_disabled(&self, date: NaiveDate) -> bool {
        !self.contains(date)
    }

    /// Narrows the window's edge days to what the congestion data actually covers.
    pub fn constraints(
        &self,
        coverage: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> PickerConstraints {
        PickerConstraints {
            window: *self,
            coverage,
        }
    }
}

/// Date, hour and minute predicates for the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerConstraints {
    window: CampaignWindow,
    coverage: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl PickerConstraints {
    pub fn minute_step(&self) -> u32 {
        self.window.minute_step
    }

    pub fn is_date_disabled(&self, date: NaiveDate) -> bool {
        self.window.is_date_disabled(date)
    }

    /// Hours that can't be picked on `date`, ascending.
    ///
    /// Only the first and last campaign days are ever restricted;
    /// a day outside the window has every hour disabled.
    pub fn disabled_hours(&self, date: NaiveDate) -> Vec<u32> {
        if self.is_date_disabled(date) {
            return (0..24).collect();
        }
        (0..24)
            .filter(|&hour| self.is_hour_disabled(date, hour))
            .collect()
    }

    /// Minutes that can't be picked at `hour` on `date`, ascending.
    pub fn disabled_minutes(&self, date: NaiveDate, hour: u32) -> Vec<u32> {
        if self.is_date_disabled(date) || self.is_hour_disabled(date, hour) {
            return (0..60).collect();
        }
        let Some((start, end)) = self.coverage else {
            return Vec::new();
        };
        (0..60)
            .filter(|&minute| {
                let before_start = date == self.window.first_day
                    && date == start.date()
                    && hour == start.hour()
                    && minute < start.minute();
                let after_end = date == self.window.last_day
                    && date == end.date()
                    && hour == end.hour()
                    && minute > end.minute();
                before_start || after_end
            })
            .collect()
    }

    fn is_hour_disabled(&self, date: NaiveDate, hour: u32) -> bool {
        let Some((start, end)) = self.coverage else {
            return false;
        };
        let before_start =
            date == self.window.first_day && date == start.date() && hour < start.hour();
        let after_end = date == self.window.last_day && date == end.date() && hour > end.hour();
        hour >= 24 || before_start || after_end
    }
}
