//! Column resolution and value extraction.

use std::collections::BTreeSet;
use std::path::Path;

use pet_map_ingest_models::{FieldMapping, ResolvedFields};

use crate::IngestError;

/// Picks the first present candidate for every field. `available` is the
/// set of column names seen in the file.
///
/// # Errors
///
/// Returns [`IngestError::UnresolvedField`] if no `x` or `y` candidate is
/// present.
pub fn resolve(
    mapping: &FieldMapping,
    available: &BTreeSet<&str>,
    path: &Path,
) -> Result<ResolvedFields, IngestError> {
    let pick = |candidates: &[String]| {
        candidates
            .iter()
            .find(|c| available.contains(c.as_str()))
            .cloned()
    };
    let require = |field: &'static str, candidates: &[String]| {
        pick(candidates).ok_or_else(|| IngestError::UnresolvedField {
            path: path.to_path_buf(),
            field,
            candidates: candidates.to_vec(),
        })
    };

    Ok(ResolvedFields {
        id: pick(&mapping.id),
        name: pick(&mapping.name),
        x: require("x", &mapping.x)?,
        y: require("y", &mapping.y)?,
    })
}

/// Every key seen across `records`.
#[must_use]
pub fn available_columns(records: &[serde_json::Value]) -> BTreeSet<&str> {
    records
        .iter()
        .filter_map(serde_json::Value::as_object)
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect()
}

/// Result of reading a coordinate cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    /// A finite or non-finite number.
    Value(f64),
    /// Cell absent, null, or blank.
    Missing,
    /// Cell present but not numeric.
    Unparseable,
}

/// Reads a numeric cell. Accepts JSON numbers and numeric strings.
#[must_use]
pub fn coordinate(record: &serde_json::Value, field: &str) -> Coordinate {
    match record.get(field) {
        None | Some(serde_json::Value::Null) => Coordinate::Missing,
        Some(serde_json::Value::Number(n)) => n.as_f64().map_or(Coordinate::Unparseable, Coordinate::Value),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Coordinate::Missing
            } else {
                s.parse::<f64>()
                    .map_or(Coordinate::Unparseable, Coordinate::Value)
            }
        }
        Some(_) => Coordinate::Unparseable,
    }
}

/// Reads a text cell. Numbers are stringified; blanks are `None`.
#[must_use]
pub fn text(record: &serde_json::Value, field: &str) -> Option<String> {
    match record.get(field)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_first_present_candidate() {
        let records = vec![json!({"경도": "129.1", "lat": "35.1", "name": "A"})];
        let available = available_columns(&records);
        let fields = resolve(&FieldMapping::default(), &available, Path::new("t.csv")).unwrap();

        assert_eq!(fields.x, "경도");
        assert_eq!(fields.y, "lat");
        assert_eq!(fields.name.as_deref(), Some("name"));
        assert_eq!(fields.id, None);
    }

    #[test]
    fn candidate_order_wins_over_column_order() {
        let records = vec![json!({"lon": "1", "x": "2", "y": "3"})];
        let available = available_columns(&records);
        let fields = resolve(&FieldMapping::default(), &available, Path::new("t.csv")).unwrap();
        assert_eq!(fields.x, "x");
    }

    #[test]
    fn missing_coordinate_column_is_an_error() {
        let records = vec![json!({"x": "1"})];
        let available = available_columns(&records);
        let err = resolve(&FieldMapping::default(), &available, Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, IngestError::UnresolvedField { field: "y", .. }));
    }

    #[test]
    fn coordinate_cells() {
        let record = json!({"a": "129.5", "b": 35.25, "c": "", "d": "abc", "e": null, "f": [1]});
        assert_eq!(coordinate(&record, "a"), Coordinate::Value(129.5));
        assert_eq!(coordinate(&record, "b"), Coordinate::Value(35.25));
        assert_eq!(coordinate(&record, "c"), Coordinate::Missing);
        assert_eq!(coordinate(&record, "d"), Coordinate::Unparseable);
        assert_eq!(coordinate(&record, "e"), Coordinate::Missing);
        assert_eq!(coordinate(&record, "f"), Coordinate::Unparseable);
        assert_eq!(coordinate(&record, "zz"), Coordinate::Missing);
    }

    #[test]
    fn text_cells() {
        let record = json!({"id": 12345, "name": " 멍카페 ", "blank": "  "});
        assert_eq!(text(&record, "id").as_deref(), Some("12345"));
        assert_eq!(text(&record, "name").as_deref(), Some("멍카페"));
        assert_eq!(text(&record, "blank"), None);
    }
}
