use crate::domain::model::{MonthlyTotal, ProductTotal, SaleRecord, SalesSummary, YearMonth};
use crate::utils::error::{ReportError, Result};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

fn overflow(what: &str, product: &str) -> ReportError {
    ReportError::ProcessingError {
        message: format!("{} out of range while adding sales of '{}'", what, product),
    }
}

fn revenue_of(record: &SaleRecord) -> Result<Decimal> {
    record.revenue().ok_or_else(|| overflow("revenue", &record.product))
}

fn add_revenue(total: Decimal, record: &SaleRecord) -> Result<Decimal> {
    total
        .checked_add(revenue_of(record)?)
        .ok_or_else(|| overflow("revenue", &record.product))
}

fn add_quantity(total: u64, record: &SaleRecord) -> Result<u64> {
    total
        .checked_add(record.quantity)
        .ok_or_else(|| overflow("quantity", &record.product))
}

/// Revenue per calendar month, oldest first. Months without sales between
/// the first and last month present are reported with a zero total.
pub fn monthly_totals(records: &[SaleRecord]) -> Result<Vec<MonthlyTotal>> {
    let mut by_month: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for record in records {
        let total = by_month.entry(record.month()).or_default();
        *total = add_revenue(*total, record)?;
    }

    let (first, last) = match (by_month.keys().next(), by_month.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(Vec::new()),
    };

    let mut totals = Vec::new();
    let mut month = first;
    while month <= last {
        totals.push(MonthlyTotal {
            month,
            total_revenue: by_month.get(&month).copied().unwrap_or_default(),
        });
        month = month.succ();
    }
    Ok(totals)
}

/// Quantity and revenue per product, highest revenue first; ties go to the
/// name that sorts first.
pub fn product_totals(records: &[SaleRecord]) -> Result<Vec<ProductTotal>> {
    let mut by_product: HashMap<&str, (u64, Decimal)> = HashMap::new();
    for record in records {
        let entry = by_product.entry(record.product.as_str()).or_default();
        entry.0 = add_quantity(entry.0, record)?;
        entry.1 = add_revenue(entry.1, record)?;
    }

    let mut totals: Vec<ProductTotal> = by_product
        .into_iter()
        .map(|(product, (total_quantity, total_revenue))| ProductTotal {
            product: product.to_string(),
            total_quantity,
            total_revenue,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then_with(|| a.product.cmp(&b.product))
    });
    Ok(totals)
}

/// Fails with `ProcessingError` when a total does not fit its type.
pub fn summarize(records: &[SaleRecord]) -> Result<SalesSummary> {
    let products = product_totals(records)?;

    let most_sold = products
        .iter()
        .min_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then_with(|| a.product.cmp(&b.product))
        })
        .cloned();
    let top_revenue = products.first().cloned();

    let mut total_quantity = 0u64;
    let mut total_revenue = Decimal::ZERO;
    for record in records {
        total_quantity = add_quantity(total_quantity, record)?;
        total_revenue = add_revenue(total_revenue, record)?;
    }

    Ok(SalesSummary {
        record_count: records.len(),
        skipped_rows: Vec::new(),
        total_quantity,
        total_revenue,
        monthly: monthly_totals(records)?,
        products,
        most_sold,
        top_revenue,
    })
}
