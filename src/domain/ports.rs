use crate::core::normalizer::NormalizeOptions;
use crate::domain::model::{ColumnType, RawDataset, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn endpoint(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn column_types(&self) -> HashMap<String, ColumnType>;
    fn normalize_options(&self) -> NormalizeOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawDataset>;
    async fn transform(&self, data: RawDataset) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
