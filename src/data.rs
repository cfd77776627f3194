//! Customer CSV loading with alias-based column resolution
//!
//! Uploaded files come from many exports, so column names vary. Each logical
//! field has an ordered candidate list probed first-match; `CustomerID` and
//! `Country` are required, everything else degrades to `None` and disables the
//! features that need it (e.g. the phone export) instead of failing the load.

use std::borrow::Cow;
use std::fs;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LensError;

pub const CUSTOMER_ID_ALIASES: &[&str] =
    &["CustomerID", "Customer ID", "customer_id", "CustomerId", "CUSTOMER_ID"];
pub const COUNTRY_ALIASES: &[&str] = &["Country", "country", "COUNTRY"];
pub const PRODUCT_NAME_ALIASES: &[&str] = &["ProductName", "Product Name", "product_name"];
pub const FIRST_NAME_ALIASES: &[&str] = &["FirstName", "First Name", "first_name"];
pub const LAST_NAME_ALIASES: &[&str] = &["LastName", "Last Name", "last_name"];
pub const CITY_ALIASES: &[&str] = &["City", "city", "CITY"];
pub const PHONE_ALIASES: &[&str] =
    &["Phone", "phone", "PhoneNumber", "Phone Number", "phone_number"];

/// One customer row. Also deserializes the records returned by the backend's
/// customer-details endpoint, hence the serde aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "CustomerID", alias = "customer_id", alias = "CustomerId")]
    pub customer_id: i64,
    #[serde(rename = "Country", alias = "country", default)]
    pub country: String,
    #[serde(rename = "ProductName", alias = "product_name", default)]
    pub product_name: Option<String>,
    #[serde(rename = "FirstName", alias = "first_name", default)]
    pub first_name: Option<String>,
    #[serde(rename = "LastName", alias = "last_name", default)]
    pub last_name: Option<String>,
    #[serde(rename = "City", alias = "city", default)]
    pub city: Option<String>,
    #[serde(rename = "Phone", alias = "phone", alias = "phone_number", default)]
    pub phone: Option<String>,
}

impl CustomerRecord {
    /// "First Last" when either part is present.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (None, None) => None,
            (first, last) => Some(
                [first.as_deref(), last.as_deref()]
                    .iter()
                    .flatten()
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }
}

/// Parsed customer table.
#[derive(Debug, Clone, Default)]
pub struct CustomerTable {
    pub records: Vec<CustomerRecord>,
}

impl CustomerTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record carries a phone number. Gates the contact export.
    pub fn has_phone_numbers(&self) -> bool {
        self.records.iter().any(|r| r.phone.is_some())
    }
}

/// Find the index of the first header matching any alias, probed in alias
/// priority order.
pub fn resolve_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        if let Some(idx) = headers.iter().position(|h| h.trim() == *alias) {
            return Some(idx);
        }
    }
    None
}

/// Decode CSV bytes as UTF-8, falling back to latin1.
pub fn decode_csv_bytes(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("input is not valid UTF-8, decoding as latin1");
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

/// Load and parse a customer CSV from disk.
pub fn load_customer_table(path: &str) -> crate::Result<CustomerTable> {
    let bytes = fs::read(path)
        .map_err(|e| anyhow::anyhow!("failed to read customer file {path:?}: {e}"))?;
    let text = decode_csv_bytes(&bytes);
    parse_customer_csv(&text)
}

/// Parse customer CSV text into records.
///
/// Rows with an empty or unparsable customer id are skipped; ids formatted as
/// floats ("17850.0") are accepted.
pub fn parse_customer_csv(text: &str) -> crate::Result<CustomerTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let id_col = resolve_column(&headers, CUSTOMER_ID_ALIASES).ok_or_else(|| {
        LensError::Schema(format!(
            "no customer id column found, tried {CUSTOMER_ID_ALIASES:?}"
        ))
    })?;
    let country_col = resolve_column(&headers, COUNTRY_ALIASES).ok_or_else(|| {
        LensError::Schema(format!("no country column found, tried {COUNTRY_ALIASES:?}"))
    })?;
    let product_col = resolve_column(&headers, PRODUCT_NAME_ALIASES);
    let first_name_col = resolve_column(&headers, FIRST_NAME_ALIASES);
    let last_name_col = resolve_column(&headers, LAST_NAME_ALIASES);
    let city_col = resolve_column(&headers, CITY_ALIASES);
    let phone_col = resolve_column(&headers, PHONE_ALIASES);

    let mut records = Vec::new();
    let mut skipped: usize = 0;

    for row in reader.records() {
        let row = row?;
        let optional = |col: Option<usize>| -> Option<String> {
            col.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let id_raw = row.get(id_col).unwrap_or("").trim();
        // Float-formatted ids are common in exports that round-tripped
        // through a dataframe.
        let customer_id = match id_raw.parse::<f64>() {
            Ok(id) if id.is_finite() => id as i64,
            _ => {
                skipped += 1;
                continue;
            }
        };

        records.push(CustomerRecord {
            customer_id,
            country: row.get(country_col).unwrap_or("").trim().to_string(),
            product_name: optional(product_col),
            first_name: optional(first_name_col),
            last_name: optional(last_name_col),
            city: optional(city_col),
            phone: optional(phone_col),
        });
    }

    if skipped > 0 {
        debug!(skipped, "skipped rows without a usable customer id");
    }

    Ok(CustomerTable { records })
}
