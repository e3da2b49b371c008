pub mod aggregate;
pub mod engine;
pub mod loader;
pub mod report;

pub use crate::domain::model::{LoadOutcome, SaleRecord, SalesSummary};
pub use crate::domain::ports::{ChartRenderer, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
