use crate::domain::model::{BarChart, InvalidRowPolicy, LoadOutcome, ReportFormat, SalesSummary};
use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn delimiter(&self) -> u8;
    /// Empty means the loader's built-in formats.
    fn date_formats(&self) -> &[String];
    fn invalid_row_policy(&self) -> InvalidRowPolicy;
    fn report_formats(&self) -> Vec<ReportFormat>;
    fn monthly_chart_name(&self) -> &str;
    fn top_products_chart_name(&self) -> &str;
    fn chart_size(&self) -> (u32, u32);
}

/// Rasterizes a chart description into encoded image bytes.
pub trait ChartRenderer {
    fn render_bar_chart(&self, chart: &BarChart) -> Result<Vec<u8>>;
}

pub trait Pipeline {
    fn extract(&self) -> Result<LoadOutcome>;
    fn transform(&self, outcome: LoadOutcome) -> Result<SalesSummary>;
    /// Writes every output and returns the paths written.
    fn load(&self, summary: &SalesSummary) -> Result<Vec<String>>;
}
