use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Chart encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Input file not found: {path}")]
    MissingInput { path: String },

    #[error("Cannot read input file {path}: {source}")]
    ReadInput {
        path: String,
        source: std::io::Error,
    },

    #[error("Missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::MissingInput { .. } | ReportError::ReadInput { .. } => {
                ErrorCategory::Input
            }
            ReportError::CsvError(_)
            | ReportError::MissingColumns { .. }
            | ReportError::InvalidRow { .. }
            | ReportError::ProcessingError { .. } => ErrorCategory::Data,
            ReportError::ConfigError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ReportError::IoError(_)
            | ReportError::SerializationError(_)
            | ReportError::ImageError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for this error: 1 for input and data problems,
    /// 2 for configuration, 3 for failures while writing outputs.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReportError::MissingInput { .. } => {
                "Place ventas.csv next to the binary or pass --input <path>".to_string()
            }
            ReportError::ReadInput { .. } => {
                "Make sure --input points to a readable file, not a directory".to_string()
            }
            ReportError::MissingColumns { .. } | ReportError::CsvError(_) => {
                "Check the header row. Expected columns: fecha, producto, cantidad, precio"
                    .to_string()
            }
            ReportError::InvalidRow { .. } => {
                "Fix the row or rerun with --skip-invalid to ignore malformed rows".to_string()
            }
            ReportError::ConfigError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => {
                "Review the command line flags or the TOML configuration file".to_string()
            }
            ReportError::IoError(_) | ReportError::ImageError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            ReportError::SerializationError(_) | ReportError::ProcessingError { .. } => {
                "Rerun with --verbose and inspect the log output".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::MissingInput { path } => format!("Cannot find the sales file: {}", path),
            ReportError::ReadInput { path, source } => {
                format!("Cannot read the sales file {}: {}", path, source)
            }
            ReportError::MissingColumns { columns } => {
                format!("The sales file is missing columns: {}", columns.join(", "))
            }
            ReportError::InvalidRow { line, reason } => {
                format!("The sales file has a malformed row at line {}: {}", line, reason)
            }
            ReportError::CsvError(e) => format!("Could not read the sales file: {}", e),
            ReportError::IoError(e) => format!("A file operation failed: {}", e),
            ReportError::ImageError(e) => format!("Could not write a chart image: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
