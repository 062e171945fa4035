//! Chart rendering with Plotters for the analytics output tables

use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use crate::basket::AssociationRule;
use crate::churn::ChurnSummary;
use crate::clv::ClvRecord;
use crate::rfm::{ScoredCustomer, Segment};
use crate::sales::{CountryRevenue, MonthlySales, ProductReturns, ProductSales};

const BAR_COLOR: RGBColor = RGBColor(70, 130, 180);

/// Truncate long category labels so axis text stays readable.
fn short_label(label: &str) -> String {
    if label.chars().count() > 18 {
        let head: String = label.chars().take(17).collect();
        format!("{head}…")
    } else {
        label.to_string()
    }
}

/// Draw a labeled vertical bar chart.
fn draw_bar_chart(
    output_path: &Path,
    title: &str,
    y_desc: &str,
    bars: &[(String, f64)],
) -> Result<()> {
    let max_value = bars.iter().map(|(_, v)| *v).fold(0.0f64, f64::max).max(1.0);
    let n = bars.len().max(1) as f64;

    let root = BitMapBackend::new(&output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<String> = bars.iter().map(|(label, _)| short_label(label)).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(90)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n - 0.5), 0f64..(max_value * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&|x: &f64| {
            let index = x.round() as usize;
            if (x - index as f64).abs() < 0.25 {
                labels.get(index).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 15))
        .label_style(("sans-serif", 12))
        .draw()?;

    for (i, (_, value)) in bars.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *value)],
            BAR_COLOR.filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Draw a histogram of a continuous value over a fixed number of bins.
fn draw_histogram(
    output_path: &Path,
    title: &str,
    x_desc: &str,
    values: &[f64],
    bins: usize,
) -> Result<()> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (min, max) = if values.is_empty() || min == max {
        (min.min(0.0), max.max(1.0))
    } else {
        (min, max)
    };
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    let max_count = counts.iter().max().copied().unwrap_or(1).max(1) as f64;

    let root = BitMapBackend::new(&output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(min..max, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, &count) in counts.iter().enumerate() {
        let x0 = min + i as f64 * width;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x0, 0.0), (x0 + width, count as f64)],
            BAR_COLOR.filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Customer count per segment.
pub fn plot_segment_counts(scored: &[ScoredCustomer], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = Segment::ALL
        .iter()
        .map(|&segment| {
            let count = scored.iter().filter(|s| s.segment == segment).count();
            (segment.label().to_string(), count as f64)
        })
        .collect();
    draw_bar_chart(output_path, "Customer Segments by Count", "Customers", &bars)
}

/// Total monetary value per segment.
pub fn plot_revenue_by_segment(scored: &[ScoredCustomer], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = Segment::ALL
        .iter()
        .map(|&segment| {
            let revenue: f64 = scored
                .iter()
                .filter(|s| s.segment == segment)
                .map(|s| s.monetary)
                .sum();
            (segment.label().to_string(), revenue)
        })
        .collect();
    draw_bar_chart(output_path, "Total Revenue by Segment", "Revenue", &bars)
}

/// Histogram of per-customer purchase counts.
pub fn plot_frequency_distribution(scored: &[ScoredCustomer], output_path: &Path) -> Result<()> {
    let values: Vec<f64> = scored.iter().map(|s| s.frequency as f64).collect();
    draw_histogram(
        output_path,
        "Distribution of Purchase Frequency",
        "Purchases",
        &values,
        30,
    )
}

/// Customer count per churn band.
pub fn plot_churn_distribution(summary: &[ChurnSummary], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = summary
        .iter()
        .map(|row| (row.churn_status.label().to_string(), row.customers as f64))
        .collect();
    draw_bar_chart(output_path, "Churn Status Distribution", "Customers", &bars)
}

/// Histogram of projected lifetime values.
pub fn plot_clv_distribution(clv: &[ClvRecord], output_path: &Path) -> Result<()> {
    let values: Vec<f64> = clv.iter().map(|r| r.clv).collect();
    draw_histogram(
        output_path,
        "Customer Lifetime Value Distribution",
        "CLV",
        &values,
        30,
    )
}

/// Lift of the top association rules.
pub fn plot_association_rules(rules: &[AssociationRule], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = rules
        .iter()
        .map(|rule| {
            let label = format!(
                "{} → {}",
                rule.antecedent.join(", "),
                rule.consequent.join(", ")
            );
            (label, rule.lift)
        })
        .collect();
    draw_bar_chart(output_path, "Top Item Combinations by Lift", "Lift", &bars)
}

/// Monthly revenue line chart.
pub fn plot_sales_over_time(monthly: &[MonthlySales], output_path: &Path) -> Result<()> {
    let max_revenue = monthly
        .iter()
        .map(|m| m.revenue)
        .fold(0.0f64, f64::max)
        .max(1.0);
    let n = monthly.len().max(2) as f64;
    let labels: Vec<String> = monthly
        .iter()
        .map(|m| format!("{}-{:02}", m.year, m.month))
        .collect();

    let root = BitMapBackend::new(&output_path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Sales Over Time", ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..(n - 1.0), 0f64..(max_revenue * 1.1))?;

    chart
        .configure_mesh()
        .x_labels(monthly.len().max(2))
        .x_label_formatter(&|x: &f64| {
            let index = x.round() as usize;
            if (x - index as f64).abs() < 0.25 {
                labels.get(index).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc("Revenue")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(LineSeries::new(
        monthly
            .iter()
            .enumerate()
            .map(|(i, m)| (i as f64, m.revenue)),
        &BAR_COLOR,
    ))?;
    chart.draw_series(
        monthly
            .iter()
            .enumerate()
            .map(|(i, m)| Circle::new((i as f64, m.revenue), 3, BAR_COLOR.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Units sold for the top products.
pub fn plot_top_selling_products(products: &[ProductSales], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = products
        .iter()
        .map(|p| (p.description.clone(), p.quantity as f64))
        .collect();
    draw_bar_chart(output_path, "Top Selling Products", "Units Sold", &bars)
}

/// Return volume for the most-returned products.
pub fn plot_product_returns(returns: &[ProductReturns], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = returns
        .iter()
        .map(|p| (p.description.clone(), p.quantity_returned as f64))
        .collect();
    draw_bar_chart(output_path, "Most Returned Products", "Units Returned", &bars)
}

/// Revenue per country.
pub fn plot_country_revenue(countries: &[CountryRevenue], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, f64)> = countries
        .iter()
        .map(|c| (c.country.clone(), c.revenue))
        .collect();
    draw_bar_chart(output_path, "Revenue by Country", "Revenue", &bars)
}
