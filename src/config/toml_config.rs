use crate::adapters::chart::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::config::{
    validate_provider, DEFAULT_DELIMITER, DEFAULT_INPUT, DEFAULT_OUTPUT_PATH, MONTHLY_CHART,
    TOP_PRODUCTS_CHART,
};
use crate::domain::model::{InvalidRowPolicy, ReportFormat};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: Option<String>,
    pub delimiter: Option<char>,
    pub date_formats: Option<Vec<String>>,
    pub on_invalid_row: Option<InvalidRowPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub monthly_chart: Option<String>,
    pub top_products_chart: Option<String>,
    pub report_formats: Option<Vec<ReportFormat>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ReportError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SALES_DIR})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_required_field("input.path", &self.input.path)?;
        if let Some(formats) = &self.output.report_formats {
            let mut seen = std::collections::HashSet::new();
            for format in formats {
                if !seen.insert(format) {
                    return Err(ReportError::InvalidConfigValueError {
                        field: "output.report_formats".to_string(),
                        value: format!("{:?}", format).to_lowercase(),
                        reason: "Duplicate report format".to_string(),
                    });
                }
            }
        }
        validate_provider(self, self.input.delimiter.unwrap_or(DEFAULT_DELIMITER))
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        self.input.path.as_deref().unwrap_or(DEFAULT_INPUT)
    }

    fn output_path(&self) -> &str {
        self.output.path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn delimiter(&self) -> u8 {
        self.input.delimiter.unwrap_or(DEFAULT_DELIMITER) as u8
    }

    fn date_formats(&self) -> &[String] {
        self.input.date_formats.as_deref().unwrap_or(&[])
    }

    fn invalid_row_policy(&self) -> InvalidRowPolicy {
        self.input.on_invalid_row.unwrap_or_default()
    }

    fn report_formats(&self) -> Vec<ReportFormat> {
        self.output
            .report_formats
            .clone()
            .unwrap_or_else(|| vec![ReportFormat::Txt])
    }

    fn monthly_chart_name(&self) -> &str {
        self.output.monthly_chart.as_deref().unwrap_or(MONTHLY_CHART)
    }

    fn top_products_chart_name(&self) -> &str {
        self.output
            .top_products_chart
            .as_deref()
            .unwrap_or(TOP_PRODUCTS_CHART)
    }

    fn chart_size(&self) -> (u32, u32) {
        (
            self.chart.width.unwrap_or(DEFAULT_WIDTH),
            self.chart.height.unwrap_or(DEFAULT_HEIGHT),
        )
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
