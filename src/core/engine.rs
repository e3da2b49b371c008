use crate::domain::model::SalesSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

/// Result of one complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: SalesSummary,
    pub outputs: Vec<String>,
}

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting sales report...");

        // Extract
        let outcome = self.pipeline.extract()?;
        tracing::info!(
            "Loaded {} records ({} skipped)",
            outcome.records.len(),
            outcome.skipped.len()
        );

        // Transform
        let summary = self.pipeline.transform(outcome)?;
        tracing::info!(
            "Aggregated {} months and {} products",
            summary.monthly.len(),
            summary.products.len()
        );

        // Load
        let outputs = self.pipeline.load(&summary)?;
        tracing::info!("Wrote {} output files", outputs.len());

        Ok(RunReport { summary, outputs })
    }
}
