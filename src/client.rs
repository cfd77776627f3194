//! Blocking HTTP client for the analysis backend
//!
//! Wraps the four backend endpoints. Transport failures (connect, timeout,
//! non-200) and malformed bodies are converted to [`LensError`] values and
//! never panic; nothing here retries — the user re-triggers manually.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing::debug;

use crate::data::CustomerRecord;
use crate::error::{LensError, LensResult};

const CLUSTER_TIMEOUT: Duration = Duration::from_secs(30);
const CONTINENT_TIMEOUT: Duration = Duration::from_secs(60);
const LEADS_TIMEOUT: Duration = Duration::from_secs(30);
const DETAILS_TIMEOUT: Duration = Duration::from_secs(60);

/// Potential customers for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLeads {
    pub product: String,
    pub customer_ids: Vec<i64>,
}

/// Client for the clustering / continent-analysis / leads endpoints.
pub struct BackendClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> crate::Result<Self> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /cluster` with the CSV as a multipart file field.
    pub fn cluster(&self, csv: Vec<u8>, filename: &str) -> LensResult<Value> {
        self.post_csv("/cluster", csv, filename, CLUSTER_TIMEOUT)
    }

    /// `POST /continent-analysis` with the CSV as a multipart file field.
    pub fn continent_analysis(&self, csv: Vec<u8>, filename: &str) -> LensResult<Value> {
        self.post_csv("/continent-analysis", csv, filename, CONTINENT_TIMEOUT)
    }

    /// `POST /api/leads/potential-customers` for the given product ids.
    pub fn potential_customers(&self, product_ids: &[String]) -> LensResult<Vec<ProductLeads>> {
        let raw = self.post_json(
            "/api/leads/potential-customers",
            &json!({ "product_ids": product_ids }),
            LEADS_TIMEOUT,
        )?;
        parse_potential_customers(&raw)
    }

    /// `POST /api/customers/details` for the given customer ids.
    pub fn customer_details(&self, customer_ids: &[i64]) -> LensResult<Vec<CustomerRecord>> {
        let raw = self.post_json(
            "/api/customers/details",
            &json!({ "customer_ids": customer_ids }),
            DETAILS_TIMEOUT,
        )?;
        parse_customer_details(&raw)
    }

    fn post_csv(
        &self,
        path: &str,
        csv: Vec<u8>,
        filename: &str,
        timeout: Duration,
    ) -> LensResult<Value> {
        let part = Part::bytes(csv)
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .map_err(|e| LensError::Transport(e.to_string()))?;
        let form = Form::new().part("file", part);

        debug!(endpoint = path, "uploading csv to backend");
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .timeout(timeout)
            .send()
            .map_err(transport)?;

        read_json(response)
    }

    fn post_json(&self, path: &str, body: &Value, timeout: Duration) -> LensResult<Value> {
        debug!(endpoint = path, "posting json to backend");
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .timeout(timeout)
            .send()
            .map_err(transport)?;

        read_json(response)
    }
}

fn transport(err: reqwest::Error) -> LensError {
    if err.is_timeout() {
        LensError::Transport("backend request timed out, please try again".to_string())
    } else if err.is_connect() {
        LensError::Transport(
            "could not connect to backend server, please check that it is running".to_string(),
        )
    } else {
        LensError::Transport(err.to_string())
    }
}

fn read_json(response: reqwest::blocking::Response) -> LensResult<Value> {
    let status = response.status();
    let text = response.text().map_err(transport)?;
    if !status.is_success() {
        return Err(LensError::Transport(format!("HTTP {status}: {text}")));
    }
    serde_json::from_str(&text)
        .map_err(|e| LensError::Payload(format!("invalid JSON response: {e}")))
}

/// Parse `{product_name: [customer_id, ...], ...}` preserving response order.
pub fn parse_potential_customers(raw: &Value) -> LensResult<Vec<ProductLeads>> {
    let outer = raw.as_object().ok_or_else(|| {
        LensError::Payload("potential customers response is not a JSON object".to_string())
    })?;

    let mut leads = Vec::with_capacity(outer.len());
    for (product, ids) in outer {
        let ids = ids.as_array().ok_or_else(|| {
            LensError::Payload(format!("customer ids for {product:?} are not a list"))
        })?;
        let customer_ids = ids
            .iter()
            .map(|v| coerce_customer_id(v, product))
            .collect::<LensResult<Vec<i64>>>()?;
        leads.push(ProductLeads {
            product: product.clone(),
            customer_ids,
        });
    }
    Ok(leads)
}

/// Customer ids arrive as integers, floats, or numeric strings.
fn coerce_customer_id(value: &Value, product: &str) -> LensResult<i64> {
    let malformed =
        || LensError::Payload(format!("customer id {value} for {product:?} is not numeric"));
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(malformed),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f as i64)
            .map_err(|_| malformed()),
        _ => Err(malformed()),
    }
}

/// Parse `{"customers": [{record}, ...]}` into customer records.
pub fn parse_customer_details(raw: &Value) -> LensResult<Vec<CustomerRecord>> {
    let customers = raw
        .get("customers")
        .ok_or_else(|| {
            LensError::Payload("customer details response is missing \"customers\"".to_string())
        })?
        .clone();
    serde_json::from_value(customers)
        .map_err(|e| LensError::Payload(format!("malformed customer record: {e}")))
}
