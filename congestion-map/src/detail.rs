//! # Road detail popup
//!
//! The text shown when a road is clicked, and its HTML rendering.

use crate::catalog::Road;
use crate::congestion::{Classification, ColorContext};
use crate::style::Color;
use chrono::NaiveDateTime;
use congestion_data::format_timestamp;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::fmt::Write;

const UNKNOWN_ENDPOINT: &str = "unknown";

/// Everything shown in the popup for a clicked road.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub road_name: String,
    pub direction: String,
    pub from_name: String,
    pub to_name: String,
    /// Kilometers, 2 decimal places.
    pub length_km: String,
    pub segment_count: usize,
    pub point_count: usize,
    pub road_id: String,
    pub query_time: String,
    pub status_label: &'static str,
    pub status_color: Color,
    /// 1 decimal place; absent when there is no numeric index.
    pub index_text: Option<String>,
}

impl DetailView {
    /// Builds the view for a road. Unknown congestion shows as gray "No data".
    pub fn new(road: &Road, time: NaiveDateTime, classification: &Classification) -> Self {
        let endpoint = |name: Option<&str>| name.unwrap_or(UNKNOWN_ENDPOINT).to_string();
        Self {
            road_name: road.name().to_string(),
            direction: road.direction().to_string(),
            from_name: endpoint(road.from_name()),
            to_name: endpoint(road.to_name()),
            length_km: format!("{:.2}", road.length_km()),
            segment_count: road.segment_count(),
            point_count: road.point_count(),
            road_id: road.id().to_string(),
            query_time: format_timestamp(&time),
            status_label: classification.label(ColorContext::DetailPanel),
            status_color: classification.color(ColorContext::DetailPanel),
            index_text: classification.index.map(|index| format!("{index:.1}")),
        }
    }

    /// Popup markup. All text is escaped.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        // Writing to a String can't fail
        let _ = writeln!(
            html,
            "<h4>{} ({})</h4>",
            escape_html(&self.road_name),
            escape_html(&self.direction)
        );
        let rows = [
            ("From", escape_html(&self.from_name)),
            ("To", escape_html(&self.to_name)),
            ("Length", format!("{} km", self.length_km)),
            ("Segments", self.segment_count.to_string()),
            ("Points", self.point_count.to_string()),
            ("Road ID", escape_html(&self.road_id)),
            ("Time", escape_html(&self.query_time)),
        ];
        for (label, value) in rows {
            let _ = writeln!(html, "<p><b>{label}:</b> {value}</p>");
        }

        let status = match &self.index_text {
            Some(index) => format!("{} ({index})", self.status_label),
            None => self.status_label.to_string(),
        };
        let _ = write!(
            html,
            "<p><b>Status:</b> <span style=\"color: {}\">{}</span></p>",
            self.status_color,
            escape_html(&status)
        );
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::congestion::NO_DATA_COLOR;
    use crate::test_support::{at, sample_catalog};

    #[test]
    fn known_index() {
        let catalog = sample_catalog();
        let road = catalog.get("1001143").expect("sample road");
        let view = DetailView::new(
            road,
            at("2019-09-01 00:20"),
            &Classification::from_index(Some(3.9)),
        );

        insta::assert_snapshot!(view.to_html(), @r#"
        <h4>Jingmi Road (north)</h4>
        <p><b>From:</b> Sihui Bridge</p>
        <p><b>To:</b> unknown</p>
        <p><b>Length:</b> 1.50 km</p>
        <p><b>Segments:</b> 2</p>
        <p><b>Points:</b> 5</p>
        <p><b>Road ID:</b> 1001143</p>
        <p><b>Time:</b> 2019-09-01 00:20</p>
        <p><b>Status:</b> <span style="color: #FAAD14">Light congestion (3.9)</span></p>
        "#);
    }

    #[test]
    fn unknown_index_is_gray_no_data() {
        let catalog = sample_catalog();
        let road = catalog.get("1001191").expect("sample road");
        let view = DetailView::new(road, at("2019-09-01 00:00"), &Classification::unknown());

        assert_eq!(view.status_label, "No data");
        assert_eq!(view.status_color, NO_DATA_COLOR);
        assert_eq!(view.index_text, None);

        let json = serde_json::to_value(&view).expect("serializable");
        assert!(json.get("index_text").is_none());
        assert_eq!(json["status_color"], "#999999");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(
            escape_html(r#"<b>"A" & 'B'</b>"#),
            "&lt;b&gt;&quot;A&quot; &amp; &#39;B&#39;&lt;/b&gt;"
        );
    }
}
