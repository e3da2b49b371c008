use crate::domain::model::{InvalidRowPolicy, LoadOutcome, RowIssue, SaleRecord};
use crate::utils::error::{ReportError, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Canonical column name followed by the header aliases accepted for it.
const COLUMNS: [(&str, &[&str]); 4] = [
    ("fecha", &["fecha", "date"]),
    ("producto", &["producto", "product"]),
    ("cantidad", &["cantidad", "quantity", "qty"]),
    ("precio", &["precio", "price", "unit_price", "precio_unitario"]),
];

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub date_formats: Vec<String>,
    pub invalid_rows: InvalidRowPolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_formats: Vec::new(),
            invalid_rows: InvalidRowPolicy::Fail,
        }
    }
}

impl LoadOptions {
    fn formats(&self) -> Vec<&str> {
        if self.date_formats.is_empty() {
            DEFAULT_DATE_FORMATS.to_vec()
        } else {
            self.date_formats.iter().map(String::as_str).collect()
        }
    }
}

/// Matches anything that is not a word character.
fn header_pattern() -> Result<Regex> {
    Regex::new(r"[^\w_]").map_err(|e| ReportError::ProcessingError {
        message: format!("Invalid header pattern: {}", e),
    })
}

fn normalize_with(pattern: &Regex, header: &str) -> String {
    let lowered = header.trim().to_lowercase().replace(' ', "_");
    pattern.replace_all(&lowered, "").into_owned()
}

/// Lower-cases a header, turns spaces into underscores and drops anything
/// that is not a word character.
pub fn normalize_header(header: &str) -> Result<String> {
    Ok(normalize_with(&header_pattern()?, header))
}

struct ColumnIndex {
    date: usize,
    product: usize,
    quantity: usize,
    price: usize,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnIndex> {
    let pattern = header_pattern()?;
    let normalized: Vec<String> = headers
        .iter()
        .map(|header| normalize_with(&pattern, header))
        .collect();
    let mut found = [None; 4];
    let mut missing = Vec::new();

    for (slot, (canonical, aliases)) in COLUMNS.iter().enumerate() {
        found[slot] = normalized
            .iter()
            .position(|name| aliases.contains(&name.as_str()));
        if found[slot].is_none() {
            missing.push(canonical.to_string());
        }
    }

    match found {
        [Some(date), Some(product), Some(quantity), Some(price)] => Ok(ColumnIndex {
            date,
            product,
            quantity,
            price,
        }),
        _ => Err(ReportError::MissingColumns { columns: missing }),
    }
}

fn parse_date(raw: &str, formats: &[&str]) -> std::result::Result<NaiveDate, String> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("unrecognized date '{}'", raw))
}

fn parse_quantity(raw: &str) -> std::result::Result<u64, String> {
    if let Ok(quantity) = raw.parse::<u64>() {
        return Ok(quantity);
    }
    match Decimal::from_str(raw) {
        Ok(value) if value.is_sign_negative() && !value.is_zero() => {
            Err(format!("negative quantity '{}'", raw))
        }
        Ok(value) if value.fract().is_zero() => value
            .to_u64()
            .ok_or_else(|| format!("quantity out of range '{}'", raw)),
        _ => Err(format!("invalid quantity '{}'", raw)),
    }
}

fn parse_price(raw: &str) -> std::result::Result<Decimal, String> {
    let price = Decimal::from_str(raw).map_err(|_| format!("invalid price '{}'", raw))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(format!("negative price '{}'", raw));
    }
    Ok(price)
}

fn parse_row(
    row: &csv::StringRecord,
    columns: &ColumnIndex,
    formats: &[&str],
) -> std::result::Result<SaleRecord, String> {
    let field = |index: usize, name: &str| {
        row.get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| format!("missing {}", name))
    };

    let record = SaleRecord {
        date: parse_date(field(columns.date, "fecha")?, formats)?,
        product: field(columns.product, "producto")?.to_string(),
        quantity: parse_quantity(field(columns.quantity, "cantidad")?)?,
        unit_price: parse_price(field(columns.price, "precio")?)?,
    };
    if record.revenue().is_none() {
        return Err("amount out of range".to_string());
    }
    Ok(record)
}

/// Parses a delimited sales file whose first row is a header.
pub fn parse_sales(data: &[u8], options: &LoadOptions) -> Result<LoadOutcome> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let columns = resolve_columns(rdr.headers()?)?;
    let formats = options.formats();
    let mut outcome = LoadOutcome::default();

    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        if row.iter().all(|value| value.is_empty()) {
            continue;
        }

        match parse_row(&row, &columns, &formats) {
            Ok(record) => outcome.records.push(record),
            Err(reason) => match options.invalid_rows {
                InvalidRowPolicy::Fail => return Err(ReportError::InvalidRow { line, reason }),
                InvalidRowPolicy::Skip => {
                    tracing::warn!("Skipping row at line {}: {}", line, reason);
                    outcome.skipped.push(RowIssue { line, reason });
                }
            },
        }
    }

    tracing::debug!(
        "Parsed {} records, skipped {}",
        outcome.records.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn skip_invalid() -> LoadOptions {
        LoadOptions {
            invalid_rows: InvalidRowPolicy::Skip,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Fecha ").unwrap(), "fecha");
        assert_eq!(normalize_header("Unit Price").unwrap(), "unit_price");
        assert_eq!(normalize_header("Precio ($)").unwrap(), "precio_");
        assert_eq!(normalize_header("Cantidad*").unwrap(), "cantidad");
    }

    #[test]
    fn test_parse_basic_file() {
        let data = b"\
fecha,producto,cantidad,precio
2024-01-05, Yerba, 2, 1500.50
2024-02-10, Mate,  1, 8000
";
        let outcome = parse_sales(data, &LoadOptions::default()).unwrap();
        assert!(outcome.skipped.is_empty());
        assert_eq!(
            outcome.records,
            vec![
                SaleRecord {
                    date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    product: "Yerba".to_string(),
                    quantity: 2,
                    unit_price: dec!(1500.50),
                },
                SaleRecord {
                    date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                    product: "Mate".to_string(),
                    quantity: 1,
                    unit_price: dec!(8000),
                },
            ]
        );
    }

    #[test]
    fn test_columns_by_alias_in_any_order() {
        let data = b"Price,Product,Notes,Quantity,Date\n9.99,Pen,blue,3,2024/05/01\n";
        let outcome = parse_sales(data, &LoadOptions::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].product, "Pen");
        assert_eq!(outcome.records[0].quantity, 3);
        assert_eq!(outcome.records[0].unit_price, dec!(9.99));
        assert_eq!(
            outcome.records[0].date,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let data = b"fecha,producto\n2024-01-01,Yerba\n";
        match parse_sales(data, &LoadOptions::default()) {
            Err(ReportError::MissingColumns { columns }) => {
                assert_eq!(columns, vec!["cantidad", "precio"]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let outcome = parse_sales(b"fecha,producto,cantidad,precio\n", &LoadOptions::default())
            .unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_invalid_row_fails_by_default() {
        let data = b"\
fecha,producto,cantidad,precio
2024-01-05,Yerba,2,100
2024-13-40,Mate,1,200
";
        match parse_sales(data, &LoadOptions::default()) {
            Err(ReportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("2024-13-40"));
            }
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rows_skipped_on_request() {
        let data = b"\
fecha,producto,cantidad,precio
2024-01-05,Yerba,2,100
2024-01-06,Mate,-1,200
2024-01-07,Bombilla,1,abc
2024-01-08,,1,10
2024-01-09,Termo
2024-01-10,Termo,1.0,5000
";
        let outcome = parse_sales(data, &skip_invalid()).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].quantity, 1);
        assert_eq!(
            outcome.skipped.iter().map(|i| i.line).collect::<Vec<_>>(),
            vec![3, 4, 5, 6]
        );
        assert!(outcome.skipped[0].reason.contains("negative quantity"));
        assert!(outcome.skipped[1].reason.contains("invalid price"));
        assert!(outcome.skipped[2].reason.contains("missing producto"));
        assert!(outcome.skipped[3].reason.contains("missing cantidad"));
    }

    #[test]
    fn test_custom_delimiter_and_date_format() {
        let options = LoadOptions {
            delimiter: b';',
            date_formats: vec!["%d.%m.%Y".to_string()],
            invalid_rows: InvalidRowPolicy::Fail,
        };
        let data = b"fecha;producto;cantidad;precio\n31.12.2023;Yerba;4;2.5\n";
        let outcome = parse_sales(data, &options).unwrap();
        assert_eq!(
            outcome.records[0].date,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_datetime_values_keep_the_date() {
        let data = b"fecha,producto,cantidad,precio\n2024-03-01 18:30:00,Yerba,1,10\n";
        let outcome = parse_sales(data, &LoadOptions::default()).unwrap();
        assert_eq!(
            outcome.records[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_amount_out_of_range_is_an_invalid_row() {
        let data = b"\
fecha,producto,cantidad,precio
2024-01-01,Yerba,18446744073709551615,99999999999
";
        match parse_sales(data, &LoadOptions::default()) {
            Err(ReportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert_eq!(reason, "amount out of range");
            }
            other => panic!("expected InvalidRow, got {:?}", other),
        }

        let outcome = parse_sales(data, &skip_invalid()).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped[0].reason, "amount out of range");
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let data = b"fecha,producto,cantidad,precio\n\n2024-03-01,Yerba,1,10\n\n";
        let outcome = parse_sales(data, &LoadOptions::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
    }
}
