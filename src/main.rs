//! RetailScope: customer analytics CLI over retail transaction logs
//!
//! This is the main entrypoint that orchestrates ingestion, normalization,
//! scoring, churn and CLV estimation, basket mining, and report output.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use retailscope::{basket, churn, clv, data, metrics, rfm, sales, transform, viz, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        println!("RetailScope - Customer Behavior Analytics");
        println!("=========================================\n");
    }

    run_pipeline(&args)
}

fn out(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Retail Analytics Pipeline ===\n");
    let start_time = Instant::now();
    let output_dir = PathBuf::from(&args.output_dir);
    std::fs::create_dir_all(&output_dir)?;

    // Step 1: Load and normalize transactions
    if args.verbose {
        println!("Step 1: Loading transactions");
        println!("  Input file: {}", args.input);
    }
    let load_start = Instant::now();
    let raw = data::load_transactions_file(Path::new(&args.input))?;
    let transactions = transform::normalize(&raw)?;
    let (sales_rows, returns_rows) = transform::split_sales_returns(&transactions);
    println!(
        "✓ Loaded {} rows ({} sales, {} returns after cleaning)",
        raw.len(),
        sales_rows.len(),
        returns_rows.len()
    );
    if args.verbose {
        println!("  Load time: {:.2}s", load_start.elapsed().as_secs_f64());
    }

    // One reference instant for the whole run; recency and churn must agree
    let today = metrics::reference_date(&transactions)?;
    let customer_metrics = metrics::aggregate_customers(&sales_rows, today);
    println!("✓ Aggregated {} customers", customer_metrics.len());

    // Step 2: RFM scoring and segmentation
    if args.verbose {
        println!("\nStep 2: RFM scoring and segmentation");
    }
    let scored = rfm::score_customers(&customer_metrics)?;
    data::save_csv(&scored, &out(&output_dir, "rfm_segments.csv"))?;
    viz::plot_segment_counts(&scored, &out(&output_dir, "rfm_segments.png"))?;
    viz::plot_revenue_by_segment(
        &scored,
        &out(&output_dir, "revenue_by_segment.png"),
    )?;
    viz::plot_frequency_distribution(
        &scored,
        &out(&output_dir, "frequency_distribution.png"),
    )?;
    println!("✓ Scored and segmented customers");

    // Step 3: Churn classification
    if args.verbose {
        println!("\nStep 3: Churn classification");
        println!("  Threshold: {} days", args.churn_threshold_days);
    }
    let churn_records = churn::classify_churn(&customer_metrics, args.churn_threshold_days)?;
    let summary = churn::churn_summary(&churn_records);
    data::save_csv(&summary, &out(&output_dir, "churn_summary.csv"))?;
    viz::plot_churn_distribution(
        &summary,
        &out(&output_dir, "churn_distribution.png"),
    )?;
    for row in &summary {
        println!("  {}: {} customers", row.churn_status, row.customers);
    }

    // Step 4: Lifetime value
    if args.verbose {
        println!("\nStep 4: Lifetime value estimation");
        println!("  Lifespan window: {} days", args.lifespan_days);
    }
    let clv_records = clv::estimate_clv(&customer_metrics, args.lifespan_days);
    let projected_loss = clv::churn_loss(&clv_records, &churn_records);
    data::save_csv(&clv_records, &out(&output_dir, "clv.csv"))?;
    viz::plot_clv_distribution(
        &clv_records,
        &out(&output_dir, "clv_distribution.png"),
    )?;
    println!("✓ Projected churn revenue loss: {projected_loss:.2}");

    // Step 5: Sales trends
    if args.verbose {
        println!("\nStep 5: Sales trend aggregation");
    }
    let monthly = sales::sales_over_time(&transactions);
    let top_products = sales::top_selling_products(&transactions, args.top_n);
    let returns_by_product = sales::product_returns(&transactions);
    let revenue_by_country = sales::country_revenue(&transactions);
    let orders_by_country = sales::country_orders(&transactions);
    data::save_csv(&monthly, &out(&output_dir, "monthly_sales.csv"))?;
    data::save_csv(&top_products, &out(&output_dir, "top_products.csv"))?;
    data::save_csv(&revenue_by_country, &out(&output_dir, "country_revenue.csv"))?;
    data::save_csv(&orders_by_country, &out(&output_dir, "country_orders.csv"))?;
    viz::plot_sales_over_time(&monthly, &out(&output_dir, "sales_trends.png"))?;
    viz::plot_top_selling_products(
        &top_products,
        &out(&output_dir, "top_products.png"),
    )?;
    viz::plot_product_returns(
        &returns_by_product,
        &out(&output_dir, "returns_trends.png"),
    )?;
    viz::plot_country_revenue(
        &revenue_by_country,
        &out(&output_dir, "country_revenue.png"),
    )?;
    println!("✓ Sales trends aggregated over {} months", monthly.len());

    // Step 6: Market basket analysis
    if args.verbose {
        println!("\nStep 6: Market basket analysis");
        println!("  Min support: {}", args.min_support);
        println!("  Min confidence: {}", args.min_confidence);
    }
    let mining_start = Instant::now();
    let matrix = basket::prepare_baskets(&sales_rows);
    let analysis = basket::mine_rules(&matrix, args.min_support, args.min_confidence)?;
    let top = basket::top_rules(&analysis.rules, args.top_n);
    let rule_records: Vec<_> = top.iter().map(|r| r.to_record()).collect();
    data::save_csv(&rule_records, &out(&output_dir, "top_rules.csv"))?;
    viz::plot_association_rules(&top, &out(&output_dir, "item_combinations.png"))?;
    if analysis.rules.is_empty() {
        println!(
            "✓ No association rules found ({} frequent itemsets over {} invoices, {} items)",
            analysis.frequent_itemsets, analysis.invoices, analysis.distinct_items
        );
    } else {
        println!(
            "✓ Mined {} rules from {} frequent itemsets",
            analysis.rules.len(),
            analysis.frequent_itemsets
        );
    }
    if args.verbose {
        println!("  Mining time: {:.2}s", mining_start.elapsed().as_secs_f64());
    }

    println!("\n=== Pipeline Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    println!("Reports written to: {}", output_dir.display());

    Ok(())
}
