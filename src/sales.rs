//! Sales trend aggregations: time, product and country breakdowns

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::transform::Transaction;

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
}

/// Units sold for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub description: String,
    pub quantity: i64,
}

/// Units returned for one product (positive count).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReturns {
    pub description: String,
    pub quantity_returned: i64,
}

/// Revenue for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRevenue {
    pub country: String,
    pub revenue: f64,
}

/// Units ordered from one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryOrders {
    pub country: String,
    pub quantity: i64,
}

/// Revenue per calendar month over positive-quantity rows, chronological.
pub fn sales_over_time(rows: &[Transaction]) -> Vec<MonthlySales> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for row in rows.iter().filter(|t| t.quantity > 0) {
        let key = (row.invoice_date.year(), row.invoice_date.month());
        *by_month.entry(key).or_insert(0.0) += row.line_total;
    }
    by_month
        .into_iter()
        .map(|((year, month), revenue)| MonthlySales {
            year,
            month,
            revenue,
        })
        .collect()
}

/// Top N products by units sold, best first.
pub fn top_selling_products(rows: &[Transaction], top_n: usize) -> Vec<ProductSales> {
    let mut by_product: BTreeMap<&str, i64> = BTreeMap::new();
    for row in rows.iter().filter(|t| t.quantity > 0) {
        *by_product.entry(row.description.as_str()).or_insert(0) += row.quantity;
    }
    let mut products: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(description, quantity)| ProductSales {
            description: description.to_string(),
            quantity,
        })
        .collect();
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    products.truncate(top_n);
    products
}

/// Return volume per product, most-returned first.
pub fn product_returns(rows: &[Transaction]) -> Vec<ProductReturns> {
    let mut by_product: BTreeMap<&str, i64> = BTreeMap::new();
    for row in rows.iter().filter(|t| t.quantity < 0) {
        *by_product.entry(row.description.as_str()).or_insert(0) += -row.quantity;
    }
    let mut products: Vec<ProductReturns> = by_product
        .into_iter()
        .map(|(description, quantity_returned)| ProductReturns {
            description: description.to_string(),
            quantity_returned,
        })
        .collect();
    products.sort_by(|a, b| b.quantity_returned.cmp(&a.quantity_returned));
    products
}

/// Revenue per country over positive-quantity rows, descending.
pub fn country_revenue(rows: &[Transaction]) -> Vec<CountryRevenue> {
    let mut by_country: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows.iter().filter(|t| t.quantity > 0) {
        *by_country.entry(row.country.as_str()).or_insert(0.0) += row.line_total;
    }
    let mut countries: Vec<CountryRevenue> = by_country
        .into_iter()
        .map(|(country, revenue)| CountryRevenue {
            country: country.to_string(),
            revenue,
        })
        .collect();
    countries.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    countries
}

/// Units ordered per country over positive-quantity rows, descending.
pub fn country_orders(rows: &[Transaction]) -> Vec<CountryOrders> {
    let mut by_country: BTreeMap<&str, i64> = BTreeMap::new();
    for row in rows.iter().filter(|t| t.quantity > 0) {
        *by_country.entry(row.country.as_str()).or_insert(0) += row.quantity;
    }
    let mut countries: Vec<CountryOrders> = by_country
        .into_iter()
        .map(|(country, quantity)| CountryOrders {
            country: country.to_string(),
            quantity,
        })
        .collect();
    countries.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    countries
}
