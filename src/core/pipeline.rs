use crate::core::client::TwseClient;
use crate::core::export;
use crate::core::normalizer::normalize;
use crate::core::{ConfigProvider, Pipeline, RawDataset, Storage, TransformResult};
use crate::utils::error::Result;
use std::io::Write;
use std::time::Duration;
use zip::write::{FileOptions, ZipWriter};

pub const OUTPUT_ARCHIVE: &str = "twse_output.zip";

pub struct TwsePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: TwseClient,
}

impl<S: Storage, C: ConfigProvider> TwsePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let mut client = TwseClient::new(config.base_url());
        if let Some(secs) = config.timeout_seconds() {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        Self {
            storage,
            config,
            client,
        }
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TwsePipeline<S, C> {
    async fn extract(&self) -> Result<RawDataset> {
        match self.client.fetch(self.config.endpoint()).await? {
            Some(dataset) => Ok(dataset),
            None => {
                tracing::warn!(
                    "No data from {}, continuing with an empty dataset",
                    self.client.url_for(self.config.endpoint())
                );
                Ok(RawDataset::default())
            }
        }
    }

    async fn transform(&self, data: RawDataset) -> Result<TransformResult> {
        let options = self.config.normalize_options();
        let overrides = self.config.column_types();
        let table = normalize(&data, &overrides, &options);

        for summary in table.summary() {
            tracing::debug!(
                "{:<24} {:<12} {} non-null",
                summary.name,
                summary.column_type,
                summary.non_null
            );
        }

        let csv_output = if self.wants("csv") {
            Some(export::to_csv(&table)?)
        } else {
            None
        };
        let tsv_output = if self.wants("tsv") {
            Some(export::to_tsv(&table)?)
        } else {
            None
        };
        let json_output = if self.wants("json") {
            Some(export::to_json(&table)?)
        } else {
            None
        };

        Ok(TransformResult {
            table,
            csv_output,
            tsv_output,
            json_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), OUTPUT_ARCHIVE);

        let entries = [
            ("output.csv", result.csv_output),
            ("output.tsv", result.tsv_output),
            ("output.json", result.json_output),
        ];

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            for (name, content) in entries {
                if let Some(content) = content {
                    tracing::debug!("Adding {} ({} bytes)", name, content.len());
                    zip.start_file::<_, ()>(name, FileOptions::default())?;
                    zip.write_all(content.as_bytes())?;
                }
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(OUTPUT_ARCHIVE, &zip_data).await?;

        Ok(output_path)
    }
}
