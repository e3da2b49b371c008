use crate::domain::model::{ProductTotal, SalesSummary};
use crate::utils::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

fn write_quantities(out: &mut String, products: &[ProductTotal]) {
    let width = label_width(products.iter().map(|p| p.product.as_str()));
    for p in products {
        let _ = writeln!(out, "{:<width$}  {:>10}", p.product, p.total_quantity, width = width);
    }
}

fn write_revenues(out: &mut String, products: &[ProductTotal]) {
    let width = label_width(products.iter().map(|p| p.product.as_str()));
    for p in products {
        let _ = writeln!(
            out,
            "{:<width$}  {:>14}",
            p.product,
            money(p.total_revenue),
            width = width
        );
    }
}

/// Plain-text report, the same content the tool echoes to the console.
pub fn render_text(summary: &SalesSummary, charts: &[String]) -> String {
    let mut out = String::new();
    out.push_str("=== Informe de Ventas ===\n\n");

    if summary.is_empty() {
        out.push_str("Sin ventas registradas.\n");
    } else {
        out.push_str("Ventas totales por mes (ARS):\n");
        for month in &summary.monthly {
            let _ = writeln!(out, "{}  {:>14}", month.month, money(month.total_revenue));
        }
        out.push('\n');

        out.push_str("Producto más vendido (por cantidad):\n");
        write_quantities(&mut out, &summary.products_by_quantity());
        if let Some(top) = &summary.most_sold {
            let _ = writeln!(out, "TOP: {} con {} unidades", top.product, top.total_quantity);
        }
        out.push('\n');

        out.push_str("Producto con mayores ingresos:\n");
        write_revenues(&mut out, &summary.products);
        if let Some(top) = &summary.top_revenue {
            let _ = writeln!(
                out,
                "TOP: {} con ingresos = {}",
                top.product,
                money(top.total_revenue)
            );
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "Total: {} registros, {} unidades, ingresos = {}",
            summary.record_count,
            summary.total_quantity,
            money(summary.total_revenue)
        );
    }

    if !summary.skipped_rows.is_empty() {
        let _ = writeln!(out, "\nFilas descartadas: {}", summary.skipped_rows.len());
        for issue in &summary.skipped_rows {
            let _ = writeln!(out, "- línea {}: {}", issue.line, issue.reason);
        }
    }

    if !charts.is_empty() {
        out.push_str("\nGráficos generados:\n");
        for chart in charts {
            let _ = writeln!(out, "- {}", chart);
        }
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: &'a SalesSummary,
    charts: &'a [String],
}

pub fn render_json(summary: &SalesSummary, charts: &[String]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport { summary, charts })?)
}
