use crate::timestamp::{TimestampError, parse_timestamp};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::BTreeMap;

/// A single congestion sample as it arrives from the source.
///
/// The source shape is a flat object: a `ts` field plus one key per road ID.
///
/// ```json
/// { "ts": "2019/9/1 0:00", "1000137": "1.186", "1001143": "1.244" }
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    /// Sampling instant, in whatever form the source used.
    pub ts: String,
    /// Congestion index per road ID.
    #[serde(flatten)]
    pub values: BTreeMap<String, RawIndexValue>,
}

impl RawSnapshot {
    /// Parses the sampling instant, truncated to the minute.
    ///
    /// # Errors
    ///
    /// Fails if `ts` is not a recognized timestamp.
    pub fn timestamp(&self) -> Result<NaiveDateTime, TimestampError> {
        parse_timestamp(&self.ts)
    }
}

/// A congestion index value.
///
/// Sources normally use decimal strings, but plain numbers are accepted too.
/// Anything else is kept so that lookups can report it as unknown
/// rather than failing the whole load.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawIndexValue {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawIndexValue {
    /// The numeric index, or `None` when the value is not a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawIndexValue::Number(value) => *value,
            RawIndexValue::Text(text) => text.trim().parse::<f64>().ok()?,
            RawIndexValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_road_keys() {
        let snapshot: RawSnapshot = serde_json::from_str(
            r#"{"ts": "2019/9/1 0:10", "1000137": "1.245", "137": 2.5, "1001191": null}"#,
        )
        .expect("valid snapshot");

        assert_eq!(snapshot.ts, "2019/9/1 0:10");
        assert_eq!(snapshot.values.len(), 3);
        assert_eq!(snapshot.values["1000137"].as_f64(), Some(1.245));
        assert_eq!(snapshot.values["137"].as_f64(), Some(2.5));
        assert_eq!(snapshot.values["1001191"].as_f64(), None);
        assert_eq!(
            snapshot.timestamp().map(|t| t.to_string()),
            Ok("2019-09-01 00:10:00".to_string())
        );
    }

    #[test]
    fn non_numeric_text_is_not_a_value() {
        assert_eq!(RawIndexValue::Text("n/a".into()).as_f64(), None);
        assert_eq!(RawIndexValue::Text(String::new()).as_f64(), None);
        assert_eq!(RawIndexValue::Text("NaN".into()).as_f64(), None);
        assert_eq!(RawIndexValue::Text(" 3.9 ".into()).as_f64(), Some(3.9));
    }
}
