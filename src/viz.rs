//! Chart rendering with Plotters and console summaries
//!
//! Renders the normalized clustering table as a blue-scale heatmap PNG and the
//! continent breakdowns as pie charts, plus the textual summaries shown after
//! each run.

use plotters::element::Pie;
use plotters::prelude::*;
use tracing::warn;

use crate::continent::{ContinentMetrics, ContinentSummary};
use crate::normalize::HeatmapTable;

/// Color palette for pie chart slices, cycled when there are more slices.
const PIE_COLORS: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

const CELL_WIDTH: i32 = 96;
const CELL_HEIGHT: i32 = 26;
const LEFT_MARGIN: i32 = 150;
const TOP_MARGIN: i32 = 70;

/// Render the country-by-segment heatmap to a PNG file.
///
/// Countries run down the left edge, segment labels across the top, and each
/// cell is shaded by customer count and annotated with the number.
pub fn render_heatmap(table: &HeatmapTable, output_path: &str) -> crate::Result<()> {
    let n_cols = table.columns().len().max(1) as i32;
    let n_rows = table.len() as i32;

    let width = (LEFT_MARGIN + CELL_WIDTH * n_cols + 30) as u32;
    let height = (TOP_MARGIN + CELL_HEIGHT * n_rows + 30).max(220) as u32;

    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    root.draw(&Text::new(
        "Customer Distribution by Country and Segment",
        (10, 10),
        ("sans-serif", 20).into_font().color(&BLACK),
    ))?;

    if table.is_empty() {
        warn!("heatmap table is empty, rendering title only");
        root.present()?;
        return Ok(());
    }

    let max_count = table.max_count().max(1) as f64;

    // Column headers
    for (col, label) in table.columns().iter().enumerate() {
        let x = LEFT_MARGIN + col as i32 * CELL_WIDTH + 8;
        root.draw(&Text::new(
            label.clone(),
            (x, TOP_MARGIN - 22),
            ("sans-serif", 15).into_font().color(&BLACK),
        ))?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let y0 = TOP_MARGIN + row_idx as i32 * CELL_HEIGHT;

        root.draw(&Text::new(
            row.country.clone(),
            (8, y0 + 6),
            ("sans-serif", 13).into_font().color(&BLACK),
        ))?;

        for (col, label) in table.columns().iter().enumerate() {
            let count = row.count(label);
            let x0 = LEFT_MARGIN + col as i32 * CELL_WIDTH;
            let shade = count as f64 / max_count;
            let fill = blue_scale(shade);

            // 1px gap between cells stands in for the white grid lines.
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + CELL_WIDTH - 1, y0 + CELL_HEIGHT - 1)],
                fill.filled(),
            ))?;

            let text_color = if shade > 0.55 { &WHITE } else { &BLACK };
            root.draw(&Text::new(
                count.to_string(),
                (x0 + CELL_WIDTH / 2 - 8, y0 + 6),
                ("sans-serif", 13).into_font().color(text_color),
            ))?;
        }
    }

    root.present()?;
    println!("Heatmap saved to: {output_path}");
    Ok(())
}

/// Blue ramp from near-white (0.0) to deep blue (1.0).
fn blue_scale(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    RGBColor(
        (247.0 - 239.0 * t) as u8,
        (251.0 - 170.0 * t) as u8,
        (255.0 - 148.0 * t) as u8,
    )
}

/// Render a pie chart from label/value slices to a PNG file.
///
/// Zero-valued slices are omitted; if nothing is left to draw the chart is
/// skipped with a warning instead of failing.
pub fn render_pie_chart(
    slices: &[(String, f64)],
    title: &str,
    output_path: &str,
) -> crate::Result<()> {
    let mut labels = Vec::new();
    let mut sizes = Vec::new();
    for (label, value) in slices {
        if *value > 0.0 {
            labels.push(label.clone());
            sizes.push(*value);
        }
    }

    if sizes.is_empty() {
        warn!(title, "no non-zero slices, skipping pie chart");
        return Ok(());
    }

    let colors: Vec<RGBColor> = (0..sizes.len())
        .map(|i| PIE_COLORS[i % PIE_COLORS.len()])
        .collect();

    let root = BitMapBackend::new(output_path, (720, 560)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24).into_font().color(&BLACK))?;

    let dims = root.dim_in_pixel();
    let center = ((dims.0 / 2) as i32, (dims.1 / 2) as i32);
    let radius = 180.0;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 13).into_font().color(&BLACK));
    root.draw(&pie)?;

    root.present()?;
    println!("Pie chart saved to: {output_path}");
    Ok(())
}

/// Print the clustering summary statistics to the console.
pub fn print_summary_statistics(table: &HeatmapTable) {
    println!("\n=== Summary Statistics ===");
    println!("Total countries: {}", table.len());
    for label in table.columns() {
        println!("{label} customers: {}", table.column_total(label));
    }
}

/// Print the top five countries per segment.
pub fn print_top_countries(table: &HeatmapTable) {
    println!("\n=== Top Countries by Segment ===");
    for label in table.columns() {
        println!("\n{label}:");
        let top = table.top_countries(label, 5);
        if top.is_empty() {
            println!("  (no customers)");
        }
        for (country, count) in top {
            println!("  {country}: {count}");
        }
    }
}

/// Print the continent breakdown and derived metrics.
pub fn print_continent_summary(rows: &[ContinentMetrics], summary: &ContinentSummary) {
    println!("\n=== Continent Analysis ===");
    println!("  Continent       | Customers | Revenue");
    println!("  ----------------|-----------|----------");
    for row in rows {
        println!(
            "  {:15} | {:9} | {:10.2}",
            row.continent, row.customer_count, row.total_revenue
        );
    }
    println!("\nTotal customers: {}", summary.total_customers);
    println!("Total revenue: ${:.2}", summary.total_revenue);
    println!(
        "Avg revenue/customer: ${:.2}",
        summary.avg_revenue_per_customer
    );
}
