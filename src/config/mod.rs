pub mod toml_config;

use crate::adapters::chart::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::domain::model::{InvalidRowPolicy, ReportFormat};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_INPUT: &str = "ventas.csv";
pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_DELIMITER: char = ',';
pub const MONTHLY_CHART: &str = "ventas_por_mes.png";
pub const TOP_PRODUCTS_CHART: &str = "ventas_top5_productos.png";
pub const INPUT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
pub const CHART_SIZE_RANGE: (u32, u32) = (200, 4096);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Checks shared by every provider.
pub(crate) fn validate_provider<C: ConfigProvider>(config: &C, delimiter: char) -> Result<()> {
    validation::validate_path("input", config.input_path())?;
    validation::validate_file_extension("input", config.input_path(), INPUT_EXTENSIONS)?;
    validation::validate_path("output_path", config.output_path())?;
    validation::validate_delimiter("delimiter", delimiter)?;
    for format in config.date_formats() {
        validation::validate_non_empty_string("date_formats", format)?;
    }
    validation::validate_file_name("monthly_chart", config.monthly_chart_name(), "png")?;
    validation::validate_file_name("top_products_chart", config.top_products_chart_name(), "png")?;

    let (width, height) = config.chart_size();
    let (min, max) = CHART_SIZE_RANGE;
    validation::validate_range("chart.width", width, min, max)?;
    validation::validate_range("chart.height", height, min, max)?;
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sales-report")]
#[command(about = "Monthly sales totals, top products and charts from a sales CSV")]
pub struct CliConfig {
    #[arg(long, help = "Sales file to read [default: ventas.csv]")]
    pub input: Option<String>,

    #[arg(long, help = "Directory for charts and reports [default: .]")]
    pub output_path: Option<String>,

    #[arg(long, help = "Field delimiter [default: ,]")]
    pub delimiter: Option<char>,

    #[arg(long = "date-format", value_delimiter = ',', help = "chrono format(s) tried in order")]
    pub date_formats: Vec<String>,

    #[arg(long, help = "Skip malformed rows instead of aborting")]
    pub skip_invalid: bool,

    #[arg(long, help = "Do not write informe.txt")]
    pub no_report: bool,

    #[arg(long, help = "Also write informe.json")]
    pub json: bool,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, help = "Do not echo the report to stdout")]
    pub quiet: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        self.input.as_deref().unwrap_or(DEFAULT_INPUT)
    }

    fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn delimiter(&self) -> u8 {
        self.delimiter.unwrap_or(DEFAULT_DELIMITER) as u8
    }

    fn date_formats(&self) -> &[String] {
        &self.date_formats
    }

    fn invalid_row_policy(&self) -> InvalidRowPolicy {
        if self.skip_invalid {
            InvalidRowPolicy::Skip
        } else {
            InvalidRowPolicy::Fail
        }
    }

    fn report_formats(&self) -> Vec<ReportFormat> {
        let mut formats = Vec::new();
        if !self.no_report {
            formats.push(ReportFormat::Txt);
        }
        if self.json {
            formats.push(ReportFormat::Json);
        }
        formats
    }

    fn monthly_chart_name(&self) -> &str {
        MONTHLY_CHART
    }

    fn top_products_chart_name(&self) -> &str {
        TOP_PRODUCTS_CHART
    }

    fn chart_size(&self) -> (u32, u32) {
        (DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self, self.delimiter.unwrap_or(DEFAULT_DELIMITER))
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_uses_defaults() {
        let config = CliConfig::try_parse_from(["sales-report"]).unwrap();
        assert_eq!(config.input_path(), "ventas.csv");
        assert_eq!(config.output_path(), ".");
        assert_eq!(config.delimiter(), b',');
        assert_eq!(config.invalid_row_policy(), InvalidRowPolicy::Fail);
        assert_eq!(config.report_formats(), vec![ReportFormat::Txt]);
        assert_eq!(config.chart_size(), (768, 576));
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = CliConfig::try_parse_from([
            "sales-report",
            "--input",
            "data/sales.tsv",
            "--delimiter",
            "\t",
            "--date-format",
            "%d.%m.%Y,%Y%m%d",
            "--skip-invalid",
            "--no-report",
            "--json",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.input_path(), "data/sales.tsv");
        assert_eq!(config.delimiter(), b'\t');
        assert_eq!(config.date_formats(), ["%d.%m.%Y", "%Y%m%d"]);
        assert_eq!(config.invalid_row_policy(), InvalidRowPolicy::Skip);
        assert_eq!(config.report_formats(), vec![ReportFormat::Json]);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let config = CliConfig::try_parse_from(["sales-report", "--input", "ventas.xlsx"]).unwrap();
        assert!(config.validate().is_err());

        let config = CliConfig::try_parse_from(["sales-report", "--delimiter", "ñ"]).unwrap();
        assert!(config.validate().is_err());
    }
}
