use crate::core::{Pipeline, TypedTable};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

/// What a run produced: where the bundle went and the typed table itself.
#[derive(Debug)]
pub struct EtlOutcome {
    pub output_path: String,
    pub table: TypedTable,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("Starting ETL process...");

        tracing::info!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.len());

        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Transformed {} rows x {} columns",
            transformed.table.row_count(),
            transformed.table.columns().len()
        );

        let table = transformed.table.clone();

        tracing::info!("Loading data...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(EtlOutcome { output_path, table })
    }
}
