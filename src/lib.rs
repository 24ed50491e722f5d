pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::toml_config::TomlConfig;
pub use core::{
    client::TwseClient,
    etl::{EtlEngine, EtlOutcome},
    normalizer::{infer_column_type, normalize, DateConvention, NormalizeOptions},
    pipeline::TwsePipeline,
};
pub use domain::model::{ColumnData, ColumnType, RawDataset, Record, TypedTable};
pub use utils::error::{EtlError, Result};
