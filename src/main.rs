//! ClusterLens: CLI frontend for a remote customer-analysis backend
//!
//! This is the main entrypoint that wires the CSV loading, backend calls,
//! response normalization, and chart rendering together.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clusterlens::client::ProductLeads;
use clusterlens::{
    aggregate_local, flatten_backend, load_customer_table, normalize, summarize, viz, Args,
    BackendClient, Command, CustomerRecord, LensError,
};

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clusterlens=info")),
        )
        .init();

    if args.verbose {
        println!("ClusterLens - Customer Clustering Frontend");
        println!("==========================================\n");
    }

    match &args.command {
        Command::Cluster { input, output } => run_cluster(&args, input, output),
        Command::Continents {
            input,
            local,
            output,
        } => {
            if *local {
                run_continents_local(&args, input, output)
            } else {
                run_continents_backend(&args, input, output)
            }
        }
        Command::Leads { products, export } => run_leads(&args, products, export.as_deref()),
    }
}

/// Upload the CSV for clustering and render the heatmap with summaries.
fn run_cluster(args: &Args, input: &str, output: &str) -> Result<()> {
    println!("=== Customer Clustering ===");
    let start = Instant::now();

    let (bytes, filename) = read_upload(input)?;
    if args.verbose {
        println!("Uploading {} ({} bytes) to {}", filename, bytes.len(), args.base_url);
    }

    let client = BackendClient::new(&args.base_url)?;
    let raw = client.cluster(bytes, &filename)?;

    let table = match normalize(&raw) {
        Ok(table) => table,
        Err(err) => return report_payload_error(err, &raw),
    };

    println!("✓ Clustering complete: {} countries", table.len());

    viz::render_heatmap(&table, output)?;
    viz::print_summary_statistics(&table);
    viz::print_top_countries(&table);

    println!("\nTotal processing time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Aggregate continents client-side from the CSV, no network call.
fn run_continents_local(args: &Args, input: &str, output: &str) -> Result<()> {
    println!("=== Continent Breakdown (local) ===");
    let start = Instant::now();

    let table = load_customer_table(input)?;
    if args.verbose {
        println!("Loaded {} customer rows from {}", table.len(), input);
    }

    let counts = aggregate_local(&table.records);
    println!("\nCustomers per continent:");
    for count in &counts {
        println!("  {}: {}", count.continent, count.customers);
    }

    let slices: Vec<(String, f64)> = counts
        .iter()
        .map(|c| (c.continent.to_string(), c.customers as f64))
        .collect();
    viz::render_pie_chart(&slices, "Customer Distribution by Continent", output)?;

    println!("\nTotal processing time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Upload the CSV for backend continent analysis and render both pies.
fn run_continents_backend(args: &Args, input: &str, output: &str) -> Result<()> {
    println!("=== Continent Analysis ===");
    let start = Instant::now();

    let (bytes, filename) = read_upload(input)?;
    if args.verbose {
        println!("Uploading {} ({} bytes) to {}", filename, bytes.len(), args.base_url);
    }

    let client = BackendClient::new(&args.base_url)?;
    let raw = client.continent_analysis(bytes, &filename)?;

    let rows = match flatten_backend(&raw) {
        Ok(rows) => rows,
        Err(err) => return report_payload_error(err, &raw),
    };

    println!("✓ Analysis complete: {} continents", rows.len());

    let summary = summarize(&rows);
    viz::print_continent_summary(&rows, &summary);

    let customer_slices: Vec<(String, f64)> = rows
        .iter()
        .map(|r| (r.continent.clone(), r.customer_count as f64))
        .collect();
    viz::render_pie_chart(&customer_slices, "Customer Count by Continent", output)?;

    let revenue_slices: Vec<(String, f64)> = rows
        .iter()
        .map(|r| (r.continent.clone(), r.total_revenue))
        .collect();
    let revenue_output = output.replace(".png", "_revenue.png");
    viz::render_pie_chart(&revenue_slices, "Revenue by Continent", &revenue_output)?;

    println!("\nTotal processing time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Fetch potential customers per product and print their detail records.
fn run_leads(args: &Args, products: &[String], export: Option<&str>) -> Result<()> {
    println!("=== Potential Customers ===");
    let start = Instant::now();

    let client = BackendClient::new(&args.base_url)?;
    let leads = client.potential_customers(products)?;

    let mut customer_ids = Vec::new();
    for lead in &leads {
        println!("{}: {} potential customers", lead.product, lead.customer_ids.len());
        for id in &lead.customer_ids {
            if !customer_ids.contains(id) {
                customer_ids.push(*id);
            }
        }
    }

    if customer_ids.is_empty() {
        println!("\nNo potential customers found.");
        return Ok(());
    }

    if args.verbose {
        println!("\nFetching details for {} customers", customer_ids.len());
    }
    let records = client.customer_details(&customer_ids)?;

    println!("\nCustomer details:");
    for record in &records {
        let name = record.display_name().unwrap_or_else(|| "(no name)".to_string());
        let city = record.city.as_deref().unwrap_or("-");
        println!("  {} | {} | {} | {}", record.customer_id, name, record.country, city);
    }

    if let Some(path) = export {
        export_contacts(&records, &leads, path)?;
    }

    println!("\nTotal processing time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Write the contact export CSV. The phone column is only included when any
/// record actually carries a phone number; otherwise the feature is disabled
/// rather than producing an empty column.
fn export_contacts(records: &[CustomerRecord], leads: &[ProductLeads], path: &str) -> Result<()> {
    let with_phone = records.iter().any(|r| r.phone.is_some());
    if !with_phone {
        tracing::info!("no phone numbers in customer details, exporting without phone column");
    }

    let product_of = |id: i64| -> &str {
        leads
            .iter()
            .find(|lead| lead.customer_ids.contains(&id))
            .map(|lead| lead.product.as_str())
            .unwrap_or("")
    };

    let mut writer = csv::Writer::from_path(path)?;
    if with_phone {
        writer.write_record(["CustomerID", "Name", "Country", "City", "Product", "Phone"])?;
    } else {
        writer.write_record(["CustomerID", "Name", "Country", "City", "Product"])?;
    }

    for record in records {
        let id = record.customer_id.to_string();
        let name = record.display_name().unwrap_or_default();
        let city = record.city.clone().unwrap_or_default();
        let product = product_of(record.customer_id).to_string();
        if with_phone {
            let phone = record.phone.clone().unwrap_or_default();
            writer.write_record([&id, &name, &record.country, &city, &product, &phone])?;
        } else {
            writer.write_record([&id, &name, &record.country, &city, &product])?;
        }
    }
    writer.flush()?;

    println!("Contact export saved to: {path}");
    Ok(())
}

/// Read the upload file and derive the multipart filename.
fn read_upload(input: &str) -> Result<(Vec<u8>, String)> {
    let bytes = match fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => bail!("failed to read input file {input:?}: {e}"),
    };
    let filename = Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());
    Ok((bytes, filename))
}

/// Show the raw response for diagnosis when the payload shape is wrong, then
/// exit nonzero. Transport errors never reach here; they propagate directly.
fn report_payload_error(err: LensError, raw: &serde_json::Value) -> Result<()> {
    eprintln!("Error processing backend response: {err}");
    eprintln!("--- raw response ---");
    eprintln!("{}", serde_json::to_string_pretty(raw)?);
    bail!("backend response could not be processed, see raw response above");
}
