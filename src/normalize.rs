//! Normalization of clustering responses into heatmap-ready tables
//!
//! The backend returns `{country: {"0": n, "1": n, "2": n, ...}, ...}`. This
//! module turns that into an ordered table with semantic segment labels,
//! sorted by total customer volume descending.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{LensError, LensResult};

/// Fixed segment-id to business-label mapping.
///
/// Keys outside this set pass through unrenamed; whether that is desirable is
/// an open question upstream, so the behavior is preserved as-is.
pub const SEGMENT_LABELS: &[(&str, &str)] = &[("0", "Premium"), ("1", "Frequent"), ("2", "Budget")];

/// Resolve a backend segment id to its display label.
pub fn segment_label(key: &str) -> &str {
    SEGMENT_LABELS
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

/// One country row of the heatmap table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapRow {
    pub country: String,
    counts: IndexMap<String, i64>,
}

impl HeatmapRow {
    /// Customer count for a segment label, 0 if the segment is absent.
    pub fn count(&self, label: &str) -> i64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Row total across all segments. Used as the sort key, never stored.
    pub fn total(&self) -> i64 {
        self.counts.values().sum()
    }
}

/// Country-by-segment count table, rows ordered by total volume descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeatmapTable {
    columns: Vec<String>,
    rows: Vec<HeatmapRow>,
}

impl HeatmapTable {
    /// Segment labels in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[HeatmapRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of one segment column over all countries.
    pub fn column_total(&self, label: &str) -> i64 {
        self.rows.iter().map(|row| row.count(label)).sum()
    }

    /// Largest single cell value, used to scale the heatmap color ramp.
    pub fn max_count(&self) -> i64 {
        self.rows
            .iter()
            .flat_map(|row| row.counts.values().copied())
            .max()
            .unwrap_or(0)
    }

    /// Top `n` countries for a segment, highest count first, zero counts
    /// excluded.
    pub fn top_countries(&self, label: &str, n: usize) -> Vec<(&str, i64)> {
        let mut entries: Vec<(&str, i64)> = self
            .rows
            .iter()
            .map(|row| (row.country.as_str(), row.count(label)))
            .filter(|(_, count)| *count > 0)
            .collect();
        entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        entries.truncate(n);
        entries
    }
}

/// Normalize a raw clustering response into a [`HeatmapTable`].
///
/// The outer object keys become country rows, the inner keys become segment
/// columns renamed via [`SEGMENT_LABELS`], and rows are sorted by their total
/// count descending (stable, so ties keep the response order).
///
/// Any shape violation is reported as [`LensError::Payload`] and no partial
/// table is returned; the caller still owns `raw` for diagnostic display.
pub fn normalize(raw: &Value) -> LensResult<HeatmapTable> {
    let outer = raw
        .as_object()
        .ok_or_else(|| LensError::Payload("clustering response is not a JSON object".to_string()))?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(outer.len());

    for (country, segments) in outer {
        let segments = segments.as_object().ok_or_else(|| {
            LensError::Payload(format!("entry for {country:?} is not an object"))
        })?;

        let mut counts = IndexMap::with_capacity(segments.len());
        for (key, value) in segments {
            let count = parse_count(value).map_err(|reason| {
                LensError::Payload(format!("segment {key:?} for {country:?}: {reason}"))
            })?;
            let label = segment_label(key).to_string();
            if !columns.contains(&label) {
                columns.push(label.clone());
            }
            counts.insert(label, count);
        }

        rows.push(HeatmapRow {
            country: country.clone(),
            counts,
        });
    }

    // Stable sort: countries with equal totals keep their response order.
    rows.sort_by_key(|row| std::cmp::Reverse(row.total()));

    Ok(HeatmapTable { columns, rows })
}

/// Coerce a JSON value to a non-negative integer count.
///
/// Accepts integers, integral floats, and numeric strings; everything else is
/// rejected with a reason.
pub(crate) fn parse_count(value: &Value) -> Result<i64, String> {
    let count = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                if f.fract() != 0.0 {
                    return Err(format!("{f} is not an integer count"));
                }
                f as i64
            } else {
                return Err(format!("{n} is out of range for a count"));
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{s:?} is not an integer count"))?,
        other => return Err(format!("{other} is not a number")),
    };

    if count < 0 {
        return Err(format!("count {count} is negative"));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_basic() {
        let raw = json!({
            "France": {"0": 5, "1": 2, "2": 1},
            "Spain": {"0": 1, "1": 1, "2": 1},
        });

        let table = normalize(&raw).unwrap();
        assert_eq!(table.columns(), &["Premium", "Frequent", "Budget"]);
        assert_eq!(table.len(), 2);

        let first = &table.rows()[0];
        assert_eq!(first.country, "France");
        assert_eq!(
            (first.count("Premium"), first.count("Frequent"), first.count("Budget")),
            (5, 2, 1)
        );
        assert_eq!(table.rows()[1].country, "Spain");
    }

    #[test]
    fn test_normalize_sorts_by_total_descending() {
        let raw = json!({
            "Spain": {"0": 1, "1": 1, "2": 1},
            "France": {"0": 10, "1": 0, "2": 0},
            "Italy": {"0": 2, "1": 2, "2": 2},
        });

        let table = normalize(&raw).unwrap();
        let order: Vec<&str> = table.rows().iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["France", "Italy", "Spain"]);
    }

    #[test]
    fn test_normalize_ties_keep_response_order() {
        let raw = json!({
            "Norway": {"0": 1, "1": 1, "2": 1},
            "Sweden": {"0": 3, "1": 0, "2": 0},
            "Finland": {"0": 0, "1": 2, "2": 1},
        });

        let table = normalize(&raw).unwrap();
        let order: Vec<&str> = table.rows().iter().map(|r| r.country.as_str()).collect();
        // All totals are 3; original response order must survive.
        assert_eq!(order, vec!["Norway", "Sweden", "Finland"]);
    }

    #[test]
    fn test_normalize_unknown_segment_passes_through() {
        let raw = json!({
            "Japan": {"0": 1, "1": 2, "2": 3, "7": 4},
        });

        let table = normalize(&raw).unwrap();
        assert_eq!(table.columns(), &["Premium", "Frequent", "Budget", "7"]);
        assert_eq!(table.rows()[0].count("7"), 4);
        assert_eq!(table.rows()[0].total(), 10);
    }

    #[test]
    fn test_normalize_accepts_numeric_strings_and_floats() {
        let raw = json!({
            "Brazil": {"0": "5", "1": 2.0, "2": 0},
        });

        let table = normalize(&raw).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.count("Premium"), 5);
        assert_eq!(row.count("Frequent"), 2);
    }

    #[test]
    fn test_normalize_rejects_malformed_count() {
        let raw = json!({
            "France": {"0": "abc", "1": 2, "2": 1},
        });

        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, LensError::Payload(_)));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_normalize_rejects_non_object_entry() {
        let raw = json!({"France": [1, 2, 3]});
        assert!(matches!(normalize(&raw), Err(LensError::Payload(_))));

        let raw = json!("not even an object");
        assert!(matches!(normalize(&raw), Err(LensError::Payload(_))));
    }

    #[test]
    fn test_normalize_rejects_negative_count() {
        let raw = json!({"France": {"0": -1, "1": 0, "2": 0}});
        assert!(matches!(normalize(&raw), Err(LensError::Payload(_))));
    }

    #[test]
    fn test_missing_segment_counts_as_zero() {
        let raw = json!({
            "Germany": {"0": 4, "1": 1, "2": 2},
            "Austria": {"0": 2},
        });

        let table = normalize(&raw).unwrap();
        let austria = table
            .rows()
            .iter()
            .find(|r| r.country == "Austria")
            .unwrap();
        assert_eq!(austria.count("Frequent"), 0);
        assert_eq!(austria.total(), 2);
    }

    #[test]
    fn test_column_totals_and_top_countries() {
        let raw = json!({
            "France": {"0": 5, "1": 2, "2": 1},
            "Spain": {"0": 1, "1": 1, "2": 1},
            "Italy": {"0": 0, "1": 4, "2": 2},
        });

        let table = normalize(&raw).unwrap();
        assert_eq!(table.column_total("Premium"), 6);
        assert_eq!(table.column_total("Frequent"), 7);
        assert_eq!(table.max_count(), 5);

        let top = table.top_countries("Premium", 5);
        assert_eq!(top, vec![("France", 5), ("Spain", 1)]);
    }

    #[test]
    fn test_empty_response_yields_empty_table() {
        let table = normalize(&json!({})).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }
}
