use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One row of the sales file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub product: String,
    pub quantity: u64,
    pub unit_price: Decimal,
}

impl SaleRecord {
    /// Quantity times unit price, or `None` when the product overflows.
    pub fn revenue(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Calendar month key, ordered chronologically and displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTotal {
    pub product: String,
    pub total_quantity: u64,
    pub total_revenue: Decimal,
}

/// A row the loader rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub line: u64,
    pub reason: String,
}

/// What to do with a row that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    #[default]
    Fail,
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub records: Vec<SaleRecord>,
    pub skipped: Vec<RowIssue>,
}

/// Everything derived from one run over the sales file.
///
/// `products` is ordered by revenue, highest first; equal revenues fall back
/// to the product name so the order is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub record_count: usize,
    pub skipped_rows: Vec<RowIssue>,
    pub total_quantity: u64,
    pub total_revenue: Decimal,
    pub monthly: Vec<MonthlyTotal>,
    pub products: Vec<ProductTotal>,
    pub most_sold: Option<ProductTotal>,
    pub top_revenue: Option<ProductTotal>,
}

impl SalesSummary {
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    pub fn top_products(&self, n: usize) -> &[ProductTotal] {
        &self.products[..n.min(self.products.len())]
    }

    pub fn products_by_quantity(&self) -> Vec<ProductTotal> {
        let mut products = self.products.clone();
        products.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then_with(|| a.product.cmp(&b.product))
        });
        products
    }
}

/// Output formats for the written summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Txt,
    Json,
}

impl ReportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Txt => "informe.txt",
            ReportFormat::Json => "informe.json",
        }
    }
}

/// Input for a chart renderer: one labelled bar per entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
    pub trend_line: bool,
}
