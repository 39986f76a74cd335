//! Shared domain types.
//!
//! These mirror the backend's JSON payloads. Everything is rebuilt per request;
//! nothing here is persisted.
//!
//! The backend is loose about numbers: a tolerance may arrive as `0.05`, as
//! `"0.05"`, as `""` or as `null`. All numeric fields therefore go through
//! [`loose_number`], which maps anything that is not a finite number to `None`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One inspection measurement for a single feature.
///
/// When both `nominal` and `actual` are present they take precedence over
/// `deviation` for tolerance checks (see `tolerance::point_breach`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPoint {
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub upper_tol: Option<f64>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub lower_tol: Option<f64>,
    /// Report file the measurement came from (used as the hover label).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Report timestamp as sent by the backend (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl MeasurementPoint {
    /// A point carrying only a raw deviation.
    pub fn with_deviation(deviation: f64) -> Self {
        Self {
            deviation: Some(deviation),
            ..Self::default()
        }
    }
}

/// One measured geometric feature (one table row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "loose_number")]
    pub latest: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: Vec<MeasurementPoint>,
}

/// Top-level `/api/cmm_summary` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
    /// Only honored when the backend sends an actual JSON number.
    #[serde(default, deserialize_with = "strict_number", skip_serializing_if = "Option::is_none")]
    pub reports_analyzed: Option<f64>,
    /// Files the backend could not parse.
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

/// Body of `POST /api/cmm_summary`. Blank filters are sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub folder: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub part_type: Option<String>,
    pub die_number: Option<String>,
}

/// A rectangle of textual difference on one side of a compared page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffBox {
    /// Normalized `[x0, y0, x1, y1]`, each in `0..=1`, origin top-left.
    #[serde(rename = "box")]
    pub rect: [f64; 4],
    /// Severity marker count (`0..=5` after clamping).
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub dash_count: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `GET /textdiff` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDiff {
    #[serde(default, deserialize_with = "null_as_default")]
    pub left: Vec<DiffBox>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub right: Vec<DiffBox>,
}

/// Part types offered by the dashboard form. Free text is still accepted.
pub const KNOWN_PART_TYPES: [&str; 3] = ["675", "50TT", "50TL"];

/// Coerce a JSON value into a finite number, or `None`.
///
/// Numbers pass through; strings are trimmed and parsed (blank → `None`);
/// everything else (null, bools, arrays, objects) is absent.
pub fn numeric(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Format with `digits` decimals like `format!("{:.N}")`, except that a value
/// sitting exactly halfway rounds away from zero instead of to even.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_finite() && is_exact_tie(value.abs(), digits) {
        let bumped = f64::from_bits(value.abs().to_bits() + 1);
        let text = format!("{bumped:.digits$}");
        return if value < 0.0 { format!("-{text}") } else { text };
    }
    format!("{value:.digits$}")
}

/// Every finite f64 has a terminating decimal expansion well within 1100 places.
fn is_exact_tie(abs: f64, digits: usize) -> bool {
    let exact = format!("{abs:.1100}");
    let Some((_, frac)) = exact.split_once('.') else {
        return false;
    };
    let mut rest = frac.get(digits..).unwrap_or("").chars();
    rest.next() == Some('5') && rest.all(|c| c == '0')
}

fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(numeric(&value))
}

fn strict_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_fixed_rounds_exact_ties_away_from_zero() {
        assert_eq!(to_fixed(1.03125, 4), "1.0313");
        assert_eq!(to_fixed(-1.03125, 4), "-1.0313");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(0.1, 4), "0.1000");
        assert_eq!(to_fixed(-0.25, 4), "-0.2500");
        assert_eq!(to_fixed(1.0312, 4), "1.0312");
    }

    #[test]
    fn numeric_fields_accept_strings_and_drop_garbage() {
        let pt: MeasurementPoint = serde_json::from_value(json!({
            "nominal": "10.5",
            "actual": " 11 ",
            "deviation": "",
            "upperTol": null,
            "lowerTol": "abc",
            "report": "r1.pdf"
        }))
        .unwrap();

        assert_eq!(pt.nominal, Some(10.5));
        assert_eq!(pt.actual, Some(11.0));
        assert_eq!(pt.deviation, None);
        assert_eq!(pt.upper_tol, None);
        assert_eq!(pt.lower_tol, None);
        assert_eq!(pt.report.as_deref(), Some("r1.pdf"));
    }

    #[test]
    fn non_finite_strings_are_absent() {
        assert_eq!(numeric(&json!("NaN")), None);
        assert_eq!(numeric(&json!("inf")), None);
        assert_eq!(numeric(&json!(true)), None);
        assert_eq!(numeric(&json!(-0.25)), Some(-0.25));
    }

    #[test]
    fn summary_tolerates_nulls_and_missing_fields() {
        let summary: Summary = serde_json::from_value(json!({
            "features": [{"name": "BORE_A", "latest": null, "points": null}],
            "errors": null
        }))
        .unwrap();

        assert_eq!(summary.features.len(), 1);
        assert!(summary.features[0].points.is_empty());
        assert_eq!(summary.features[0].latest, None);
        assert_eq!(summary.reports_analyzed, None);
        assert!(summary.errors.is_empty());

        let empty: Summary = serde_json::from_str("{}").unwrap();
        assert!(empty.features.is_empty());
    }

    #[test]
    fn reports_analyzed_requires_a_json_number() {
        let summary: Summary = serde_json::from_value(json!({"reportsAnalyzed": "7"})).unwrap();
        assert_eq!(summary.reports_analyzed, None);
        let summary: Summary = serde_json::from_value(json!({"reportsAnalyzed": 7})).unwrap();
        assert_eq!(summary.reports_analyzed, Some(7.0));
    }

    #[test]
    fn request_serializes_camel_case_with_nulls() {
        let req = SummaryRequest {
            folder: "/data/cmm".to_string(),
            die_number: Some("D7".to_string()),
            ..SummaryRequest::default()
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "folder": "/data/cmm",
                "startDate": null,
                "endDate": null,
                "partType": null,
                "dieNumber": "D7"
            })
        );
    }

    #[test]
    fn diff_box_reads_box_key() {
        let diff: TextDiff = serde_json::from_value(json!({
            "left": [{"box": [0.1, 0.2, 0.3, 0.4], "text": "12.5"}],
            "right": [{"box": [0.1, 0.2, 0.3, 0.4], "dashCount": 3, "improved": true}]
        }))
        .unwrap();

        assert_eq!(diff.left[0].rect, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(diff.left[0].dash_count, None);
        assert!(!diff.left[0].improved);
        assert_eq!(diff.right[0].dash_count, Some(3.0));
        assert!(diff.right[0].improved);
    }
}
