use crate::adapters::chart::PngChartRenderer;
use crate::core::aggregate::summarize;
use crate::core::loader::{parse_sales, LoadOptions};
use crate::core::report::{render_json, render_text};
use crate::domain::model::{BarChart, LoadOutcome, ReportFormat, SalesSummary};
use crate::domain::ports::{ChartRenderer, ConfigProvider, Pipeline, Storage};
use crate::utils::error::{ReportError, Result};
use rust_decimal::prelude::ToPrimitive;
use std::path::Path;

/// Number of products in the revenue chart.
pub const TOP_PRODUCTS: usize = 5;

pub struct SalesPipeline<S: Storage, C: ConfigProvider, R: ChartRenderer = PngChartRenderer> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) renderer: R,
}

impl<S: Storage, C: ConfigProvider> SalesPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let (width, height) = config.chart_size();
        Self {
            storage,
            config,
            renderer: PngChartRenderer::new(width, height),
        }
    }
}

impl<S: Storage, C: ConfigProvider, R: ChartRenderer> SalesPipeline<S, C, R> {
    pub fn with_renderer(storage: S, config: C, renderer: R) -> Self {
        Self {
            storage,
            config,
            renderer,
        }
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.config.delimiter(),
            date_formats: self.config.date_formats().to_vec(),
            invalid_rows: self.config.invalid_row_policy(),
        }
    }

    fn write_chart(&self, name: &str, chart: &BarChart) -> Result<String> {
        let png = self.renderer.render_bar_chart(chart)?;
        let path = self.output_file(name);
        self.storage.write_file(&path, &png)?;
        tracing::info!("💾 Chart saved: {}", path);
        Ok(path)
    }
}

fn monthly_chart(summary: &SalesSummary) -> BarChart {
    BarChart {
        title: "Ventas totales por mes".to_string(),
        x_label: "Mes".to_string(),
        y_label: "Ingresos".to_string(),
        bars: summary
            .monthly
            .iter()
            .map(|m| (m.month.to_string(), m.total_revenue.to_f64().unwrap_or_default()))
            .collect(),
        trend_line: true,
    }
}

fn top_products_chart(summary: &SalesSummary) -> BarChart {
    BarChart {
        title: format!("Ventas por producto (Top {} por ingresos)", TOP_PRODUCTS),
        x_label: "Producto".to_string(),
        y_label: "Ingresos".to_string(),
        bars: summary
            .top_products(TOP_PRODUCTS)
            .iter()
            .map(|p| (p.product.clone(), p.total_revenue.to_f64().unwrap_or_default()))
            .collect(),
        trend_line: false,
    }
}

impl<S: Storage, C: ConfigProvider, R: ChartRenderer> Pipeline for SalesPipeline<S, C, R> {
    fn extract(&self) -> Result<LoadOutcome> {
        let input = self.config.input_path();
        tracing::debug!("Reading sales file: {}", input);

        let data = match self.storage.read_file(input) {
            Ok(data) => data,
            Err(ReportError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReportError::MissingInput {
                    path: input.to_string(),
                });
            }
            Err(ReportError::IoError(source)) => {
                return Err(ReportError::ReadInput {
                    path: input.to_string(),
                    source,
                });
            }
            Err(e) => return Err(e),
        };

        parse_sales(&data, &self.load_options())
    }

    fn transform(&self, outcome: LoadOutcome) -> Result<SalesSummary> {
        let mut summary = summarize(&outcome.records)?;
        summary.skipped_rows = outcome.skipped;
        Ok(summary)
    }

    fn load(&self, summary: &SalesSummary) -> Result<Vec<String>> {
        let mut written = Vec::new();
        let mut chart_names = Vec::new();

        if summary.is_empty() {
            tracing::warn!("No sales records found, skipping charts");
        } else {
            let monthly_name = self.config.monthly_chart_name();
            written.push(self.write_chart(monthly_name, &monthly_chart(summary))?);
            chart_names.push(monthly_name.to_string());

            let top_name = self.config.top_products_chart_name();
            written.push(self.write_chart(top_name, &top_products_chart(summary))?);
            chart_names.push(top_name.to_string());
        }

        for format in self.config.report_formats() {
            let content = match format {
                ReportFormat::Txt => render_text(summary, &chart_names),
                ReportFormat::Json => render_json(summary, &chart_names)?,
            };
            let path = self.output_file(format.file_name());
            self.storage.write_file(&path, content.as_bytes())?;
            tracing::info!("📝 Report saved: {}", path);
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::TomlConfig;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockStorage {
        files: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &[u8]) -> Self {
            let storage = Self::default();
            storage
                .files
                .borrow_mut()
                .insert(path.to_string(), data.to_vec());
            storage
        }

        fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.borrow().get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.borrow().get(path).cloned().ok_or_else(|| {
                ReportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    /// Records every chart it is asked to draw and returns a marker payload.
    #[derive(Default)]
    struct RecordingRenderer {
        charts: RefCell<Vec<BarChart>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render_bar_chart(&self, chart: &BarChart) -> Result<Vec<u8>> {
            self.charts.borrow_mut().push(chart.clone());
            Ok(b"chart".to_vec())
        }
    }

    const SALES: &[u8] = b"\
fecha,producto,cantidad,precio
2024-01-03,Yerba,10,1500
2024-01-20,Mate,1,9000.50
2024-02-02,Yerba,5,1600
2024-02-14,Termo,2,25000
2024-02-28,Bombilla,12,800
2024-03-01,Azucar,3,900
2024-03-02,Galletitas,4,700
";

    fn config(extra: &str) -> TomlConfig {
        TomlConfig::from_toml_str(&format!(
            "[input]\npath = \"ventas.csv\"\n[output]\npath = \"out\"\n{}",
            extra
        ))
        .unwrap()
    }

    #[test]
    fn test_extract_missing_file() {
        let pipeline = SalesPipeline::new(MockStorage::default(), config(""));
        match pipeline.extract() {
            Err(ReportError::MissingInput { path }) => assert_eq!(path, "ventas.csv"),
            other => panic!("expected MissingInput, got {:?}", other),
        }
    }

    /// Storage whose reads are always refused.
    struct UnreadableStorage;

    impl Storage for UnreadableStorage {
        fn read_file(&self, _path: &str) -> Result<Vec<u8>> {
            Err(ReportError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "Permission denied",
            )))
        }

        fn write_file(&self, _path: &str, _data: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_extract_unreadable_input_is_an_input_error() {
        let pipeline = SalesPipeline::new(UnreadableStorage, config(""));
        let err = pipeline.extract().unwrap_err();
        assert!(matches!(&err, ReportError::ReadInput { path, .. } if path == "ventas.csv"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_transform_reports_overflow() {
        let data = b"fecha,producto,cantidad,precio\n2024-01-01,Yerba,18446744073709551615,0\n2024-01-02,Yerba,1,0\n";
        let pipeline = SalesPipeline::new(MockStorage::with_file("ventas.csv", data), config(""));
        let outcome = pipeline.extract().unwrap();
        assert!(matches!(
            pipeline.transform(outcome),
            Err(ReportError::ProcessingError { .. })
        ));
    }

    #[test]
    fn test_transform_carries_skipped_rows() {
        let data = b"fecha,producto,cantidad,precio\n2024-01-01,Yerba,1,10\nbad,Mate,1,10\n";
        let pipeline = SalesPipeline::new(MockStorage::with_file("ventas.csv", data), config(""));
        assert!(matches!(
            pipeline.extract(),
            Err(ReportError::InvalidRow { line: 3, .. })
        ));

        let mut skip = config("");
        skip.input.on_invalid_row = Some(crate::domain::model::InvalidRowPolicy::Skip);
        let pipeline = SalesPipeline::new(MockStorage::with_file("ventas.csv", data), skip);
        let outcome = pipeline.extract().unwrap();
        let summary = pipeline.transform(outcome).unwrap();
        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.skipped_rows.len(), 1);
        assert_eq!(summary.skipped_rows[0].line, 3);
    }

    #[test]
    fn test_load_writes_charts_and_report() {
        let renderer = RecordingRenderer::default();
        let pipeline = SalesPipeline::with_renderer(
            MockStorage::with_file("ventas.csv", SALES),
            config(""),
            renderer,
        );

        let summary = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        let written = pipeline.load(&summary).unwrap();

        assert_eq!(
            written,
            vec![
                "out/ventas_por_mes.png",
                "out/ventas_top5_productos.png",
                "out/informe.txt"
            ]
        );
        assert_eq!(
            pipeline.storage.get_file("out/ventas_por_mes.png").unwrap(),
            b"chart"
        );

        let charts = pipeline.renderer.charts.borrow();
        assert_eq!(charts.len(), 2);
        let months: Vec<&str> = charts[0].bars.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(charts[0].bars[1].1, 67600.0);
        assert!(charts[0].trend_line);

        let products: Vec<&str> = charts[1].bars.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(products, vec!["Termo", "Yerba", "Bombilla", "Mate", "Galletitas"]);

        let report = String::from_utf8(pipeline.storage.get_file("out/informe.txt").unwrap()).unwrap();
        assert!(report.contains("TOP: Yerba con 15 unidades"));
        assert!(report.contains("TOP: Termo con ingresos = 50000.00"));
        assert_eq!(summary.top_revenue.as_ref().unwrap().total_revenue, dec!(50000));
    }

    #[test]
    fn test_load_json_only() {
        let pipeline = SalesPipeline::with_renderer(
            MockStorage::with_file("ventas.csv", SALES),
            config("report_formats = [\"json\"]\n"),
            RecordingRenderer::default(),
        );

        let summary = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        let written = pipeline.load(&summary).unwrap();

        assert_eq!(written.last().unwrap(), "out/informe.json");
        assert!(pipeline.storage.get_file("out/informe.txt").is_none());
        let json = pipeline.storage.get_file("out/informe.json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["record_count"], 7);
    }

    #[test]
    fn test_empty_input_skips_charts() {
        let pipeline = SalesPipeline::with_renderer(
            MockStorage::with_file("ventas.csv", b"fecha,producto,cantidad,precio\n"),
            config(""),
            RecordingRenderer::default(),
        );

        let summary = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        assert!(summary.is_empty());

        let written = pipeline.load(&summary).unwrap();
        assert_eq!(written, vec!["out/informe.txt"]);
        assert!(pipeline.renderer.charts.borrow().is_empty());
        let report = String::from_utf8(pipeline.storage.get_file("out/informe.txt").unwrap()).unwrap();
        assert!(report.contains("Sin ventas registradas."));
    }

    #[test]
    fn test_real_renderer_writes_png() {
        let pipeline = SalesPipeline::new(MockStorage::with_file("ventas.csv", SALES), config(""));
        let summary = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        pipeline.load(&summary).unwrap();

        let png = pipeline.storage.get_file("out/ventas_top5_productos.png").unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
