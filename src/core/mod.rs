pub mod client;
pub mod dates;
pub mod etl;
pub mod export;
pub mod normalizer;
pub mod pipeline;

pub use crate::domain::model::{RawDataset, Record, TransformResult, TypedTable};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
