// Adapters layer: concrete implementations of the domain ports.

pub mod chart;
pub mod storage;

pub use chart::PngChartRenderer;
pub use storage::LocalStorage;
