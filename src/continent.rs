//! Continent-level aggregation of customer data
//!
//! Two variants: a local aggregation over the uploaded customer table using a
//! static country-to-continent lookup, and a flattening of the backend's
//! per-continent `{customer_count, total_revenue}` response.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use serde_json::Value;
use tracing::debug;

use crate::data::CustomerRecord;
use crate::error::{LensError, LensResult};
use crate::normalize::parse_count;

/// The five macro-regions reported by the local aggregation, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continent {
    Europe,
    Asia,
    Oceania,
    SouthAmerica,
    NorthAmerica,
}

impl Continent {
    pub const ALL: [Continent; 5] = [
        Continent::Europe,
        Continent::Asia,
        Continent::Oceania,
        Continent::SouthAmerica,
        Continent::NorthAmerica,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Continent::Europe => "Europe",
            Continent::Asia => "Asia",
            Continent::Oceania => "Oceania",
            Continent::SouthAmerica => "South America",
            Continent::NorthAmerica => "North America",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static country-to-continent table. Countries absent from this list fall
/// into an interior `Other` bucket that is logged and dropped from output.
static COUNTRY_TO_CONTINENT: &[(&str, Continent)] = &[
    ("France", Continent::Europe),
    ("Spain", Continent::Europe),
    ("Italy", Continent::Europe),
    ("Germany", Continent::Europe),
    ("Sweden", Continent::Europe),
    ("Belgium", Continent::Europe),
    ("UK", Continent::Europe),
    ("Norway", Continent::Europe),
    ("Finland", Continent::Europe),
    ("Switzerland", Continent::Europe),
    ("Austria", Continent::Europe),
    ("Denmark", Continent::Europe),
    ("Ireland", Continent::Europe),
    ("Portugal", Continent::Europe),
    ("Netherlands", Continent::Europe),
    ("Poland", Continent::Europe),
    ("Singapore", Continent::Asia),
    ("Japan", Continent::Asia),
    ("Australia", Continent::Oceania),
    ("Brazil", Continent::SouthAmerica),
    ("Venezuela", Continent::SouthAmerica),
    ("Argentina", Continent::SouthAmerica),
    ("USA", Continent::NorthAmerica),
    ("Canada", Continent::NorthAmerica),
    ("Mexico", Continent::NorthAmerica),
];

static LOOKUP: LazyLock<HashMap<&'static str, Continent>> =
    LazyLock::new(|| COUNTRY_TO_CONTINENT.iter().copied().collect());

/// Continent for a country name, `None` for unmapped countries.
pub fn continent_of(country: &str) -> Option<Continent> {
    LOOKUP.get(country).copied()
}

/// Customer count for one continent bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinentCount {
    pub continent: Continent,
    pub customers: u64,
}

/// One flattened row of the backend continent-analysis response.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinentMetrics {
    pub continent: String,
    pub customer_count: u64,
    pub total_revenue: f64,
}

/// Display metrics derived from a set of [`ContinentMetrics`] rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinentSummary {
    pub total_customers: u64,
    pub total_revenue: f64,
    pub avg_revenue_per_customer: f64,
}

/// Count unique customers per continent from the uploaded table.
///
/// Customers are de-duplicated by id, first occurrence wins. The result always
/// has exactly five rows in [`Continent::ALL`] order, zero-initialized, so the
/// pie chart sees a stable shape regardless of input.
pub fn aggregate_local(customers: &[CustomerRecord]) -> Vec<ContinentCount> {
    let mut seen = HashSet::with_capacity(customers.len());
    let mut buckets: HashMap<Continent, u64> = HashMap::new();
    let mut other: u64 = 0;

    for record in customers {
        if !seen.insert(record.customer_id) {
            continue;
        }
        match continent_of(&record.country) {
            Some(continent) => *buckets.entry(continent).or_insert(0) += 1,
            None => other += 1,
        }
    }

    if other > 0 {
        // Unmapped countries are counted but not reported.
        debug!(unmapped_customers = other, "dropping Other continent bucket");
    }

    Continent::ALL
        .iter()
        .map(|&continent| ContinentCount {
            continent,
            customers: buckets.get(&continent).copied().unwrap_or(0),
        })
        .collect()
}

/// Flatten the backend continent-analysis response into sortable rows.
///
/// Every entry must carry numeric `customer_count` and `total_revenue`; a
/// missing or malformed field is a payload error. Rows come back sorted by
/// revenue descending; the sort is stable so ties keep the response order.
pub fn flatten_backend(raw: &Value) -> LensResult<Vec<ContinentMetrics>> {
    let outer = raw.as_object().ok_or_else(|| {
        LensError::Payload("continent analysis response is not a JSON object".to_string())
    })?;

    let mut rows = Vec::with_capacity(outer.len());
    for (continent, metrics) in outer {
        let metrics = metrics.as_object().ok_or_else(|| {
            LensError::Payload(format!("entry for {continent:?} is not an object"))
        })?;

        let customer_count = metrics
            .get("customer_count")
            .ok_or_else(|| LensError::Payload(format!("{continent:?} is missing customer_count")))
            .and_then(|v| {
                parse_count(v).map_err(|reason| {
                    LensError::Payload(format!("customer_count for {continent:?}: {reason}"))
                })
            })? as u64;

        let total_revenue = metrics
            .get("total_revenue")
            .ok_or_else(|| LensError::Payload(format!("{continent:?} is missing total_revenue")))?
            .as_f64()
            .ok_or_else(|| {
                LensError::Payload(format!("total_revenue for {continent:?} is not a number"))
            })?;

        rows.push(ContinentMetrics {
            continent: continent.clone(),
            customer_count,
            total_revenue,
        });
    }

    // Stable sort keeps response order for equal revenues.
    rows.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    Ok(rows)
}

/// Totals and average revenue per customer over the flattened rows.
///
/// The average is defined as 0.0 when there are no customers.
pub fn summarize(rows: &[ContinentMetrics]) -> ContinentSummary {
    let total_customers: u64 = rows.iter().map(|r| r.customer_count).sum();
    let total_revenue: f64 = rows.iter().map(|r| r.total_revenue).sum();
    let avg_revenue_per_customer = if total_customers == 0 {
        0.0
    } else {
        total_revenue / total_customers as f64
    };

    ContinentSummary {
        total_customers,
        total_revenue,
        avg_revenue_per_customer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, country: &str) -> CustomerRecord {
        CustomerRecord {
            customer_id: id,
            country: country.to_string(),
            ..CustomerRecord::default()
        }
    }

    #[test]
    fn test_lookup_table() {
        assert_eq!(continent_of("France"), Some(Continent::Europe));
        assert_eq!(continent_of("Japan"), Some(Continent::Asia));
        assert_eq!(continent_of("Brazil"), Some(Continent::SouthAmerica));
        assert_eq!(continent_of("Atlantis"), None);
    }

    #[test]
    fn test_aggregate_local_always_five_buckets() {
        let counts = aggregate_local(&[]);
        assert_eq!(counts.len(), 5);
        let order: Vec<&str> = counts.iter().map(|c| c.continent.name()).collect();
        assert_eq!(
            order,
            vec!["Europe", "Asia", "Oceania", "South America", "North America"]
        );
        assert!(counts.iter().all(|c| c.customers == 0));
    }

    #[test]
    fn test_aggregate_local_counts_and_drops_other() {
        let customers = vec![
            record(1, "France"),
            record(2, "Spain"),
            record(3, "Japan"),
            record(4, "Atlantis"), // unmapped, dropped from output
            record(5, "USA"),
        ];

        let counts = aggregate_local(&customers);
        let by_name: HashMap<&str, u64> = counts
            .iter()
            .map(|c| (c.continent.name(), c.customers))
            .collect();

        assert_eq!(by_name["Europe"], 2);
        assert_eq!(by_name["Asia"], 1);
        assert_eq!(by_name["North America"], 1);
        assert_eq!(by_name["Oceania"], 0);

        // The Other bucket never leaks into the result.
        let total: u64 = counts.iter().map(|c| c.customers).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_aggregate_local_dedup_first_occurrence_wins() {
        let customers = vec![
            record(1, "France"),
            record(1, "Japan"), // same customer, later row dropped
            record(2, "Japan"),
        ];

        let counts = aggregate_local(&customers);
        let by_name: HashMap<&str, u64> = counts
            .iter()
            .map(|c| (c.continent.name(), c.customers))
            .collect();

        assert_eq!(by_name["Europe"], 1);
        assert_eq!(by_name["Asia"], 1);
    }

    #[test]
    fn test_flatten_backend_sorts_by_revenue() {
        let raw = json!({
            "Europe": {"customer_count": 10, "total_revenue": 1000.0},
            "Asia": {"customer_count": 5, "total_revenue": 2000.0},
        });

        let rows = flatten_backend(&raw).unwrap();
        assert_eq!(rows[0].continent, "Asia");
        assert_eq!(rows[0].customer_count, 5);
        assert_eq!(rows[1].continent, "Europe");

        let summary = summarize(&rows);
        assert_eq!(summary.total_customers, 15);
        assert_eq!(summary.total_revenue, 3000.0);
        assert_eq!(summary.avg_revenue_per_customer, 200.0);
    }

    #[test]
    fn test_flatten_backend_tie_keeps_response_order() {
        let raw = json!({
            "Europe": {"customer_count": 1, "total_revenue": 50.0},
            "Asia": {"customer_count": 2, "total_revenue": 50.0},
        });

        let rows = flatten_backend(&raw).unwrap();
        assert_eq!(rows[0].continent, "Europe");
        assert_eq!(rows[1].continent, "Asia");
    }

    #[test]
    fn test_flatten_backend_missing_field_is_error() {
        let raw = json!({"Europe": {"total_revenue": 100.0}});
        let err = flatten_backend(&raw).unwrap_err();
        assert!(matches!(err, LensError::Payload(_)));
        assert!(err.to_string().contains("customer_count"));

        let raw = json!({"Europe": {"customer_count": 3}});
        assert!(matches!(flatten_backend(&raw), Err(LensError::Payload(_))));
    }

    #[test]
    fn test_flatten_backend_non_numeric_is_error() {
        let raw = json!({"Europe": {"customer_count": "lots", "total_revenue": 1.0}});
        assert!(matches!(flatten_backend(&raw), Err(LensError::Payload(_))));
    }

    #[test]
    fn test_summarize_zero_customers() {
        let rows = vec![ContinentMetrics {
            continent: "Europe".to_string(),
            customer_count: 0,
            total_revenue: 0.0,
        }];

        let summary = summarize(&rows);
        assert_eq!(summary.avg_revenue_per_customer, 0.0);

        let empty = summarize(&[]);
        assert_eq!(empty.avg_revenue_per_customer, 0.0);
    }
}
