pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use adapters::{LocalStorage, PngChartRenderer};
pub use app::pipelines::SalesPipeline;
pub use core::engine::{ReportEngine, RunReport};
pub use utils::error::{ReportError, Result};
