use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// A road record as it arrives from the source data.
///
/// Field names follow the upper-case columns of the source export.
/// Nothing here is validated; geometry in particular is untrusted text
/// which is only parsed when the catalog is built.
#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawRoad {
    /// The canonical (long-form) road identifier.
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "NAME")]
    pub name: String,
    /// Travel direction label.
    ///
    /// Several records may share a name and differ only by direction.
    #[serde(rename = "DIRECTION")]
    pub direction: String,
    /// Name of the starting endpoint, if known.
    #[serde(rename = "FNAME", default)]
    pub from_name: Option<String>,
    /// Name of the ending endpoint, if known.
    #[serde(rename = "TNAME", default)]
    pub to_name: Option<String>,
    /// Length in meters. Exports carry this as either a number or a numeric string.
    #[serde(rename = "LENGTH")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub length_m: f64,
    /// Well-known-text geometry (`LINESTRING(...)` or `MULTILINESTRING(...)`).
    #[serde(rename = "WKT", default)]
    pub wkt: Option<String>,
}
