#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::client::{industry_eps_column_types, INDUSTRY_EPS_ENDPOINT};
use crate::domain::model::ColumnType;
use std::collections::HashMap;

/// Dataset presets first, explicit overrides on top.
pub fn resolve_column_types<'a>(
    endpoint: &str,
    use_presets: bool,
    overrides: impl IntoIterator<Item = (&'a String, &'a ColumnType)>,
) -> HashMap<String, ColumnType> {
    let mut types = if use_presets && endpoint == INDUSTRY_EPS_ENDPOINT {
        industry_eps_column_types()
    } else {
        HashMap::new()
    };
    types.extend(overrides.into_iter().map(|(k, v)| (k.clone(), *v)));
    types
}

/// Parse a `COLUMN=TYPE` pair, e.g. `公司代號=categorical`.
pub fn parse_column_override(raw: &str) -> std::result::Result<(String, ColumnType), String> {
    let (column, column_type) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected COLUMN=TYPE, got '{}'", raw))?;
    if column.trim().is_empty() {
        return Err(format!("missing column name in '{}'", raw));
    }
    Ok((column.trim().to_string(), column_type.parse()?))
}

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use super::{parse_column_override, resolve_column_types};
    use crate::core::client::{DEFAULT_BASE_URL, INDUSTRY_EPS_ENDPOINT};
    use crate::core::normalizer::{DateConvention, NormalizeOptions};
    use crate::core::ConfigProvider;
    use crate::domain::model::ColumnType;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "twse-etl")]
    #[command(about = "Fetch TWSE OpenAPI datasets and normalize them into typed tables")]
    pub struct CliConfig {
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        pub base_url: String,

        #[arg(long, default_value = INDUSTRY_EPS_ENDPOINT)]
        pub endpoint: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_values = ["csv", "tsv", "json"])]
        pub formats: Vec<String>,

        /// Force a column type, e.g. --force-type 公司代號=categorical
        #[arg(long = "force-type", value_name = "COLUMN=TYPE", value_parser = parse_column_override)]
        pub force_types: Vec<(String, ColumnType)>,

        #[arg(long, help = "Do not apply the built-in column types of known datasets")]
        pub no_preset_types: bool,

        #[arg(long, help = "Treat 8-digit YYYYMMDD as the date format instead of the local era")]
        pub iso_dates: bool,

        #[arg(long)]
        pub no_parse_dates: bool,

        #[arg(long)]
        pub no_parse_numbers: bool,

        #[arg(long)]
        pub no_parse_categories: bool,

        #[arg(long, help = "Keep every column as raw text")]
        pub raw: bool,

        #[arg(long)]
        pub timeout_seconds: Option<u64>,

        #[arg(long, default_value = "5", help = "Rows to preview after the run")]
        pub head: usize,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl ConfigProvider for CliConfig {
        fn base_url(&self) -> &str {
            &self.base_url
        }

        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        fn timeout_seconds(&self) -> Option<u64> {
            self.timeout_seconds
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn column_types(&self) -> HashMap<String, ColumnType> {
            resolve_column_types(
                &self.endpoint,
                !self.no_preset_types,
                self.force_types.iter().map(|(k, v)| (k, v)),
            )
        }

        fn normalize_options(&self) -> NormalizeOptions {
            NormalizeOptions {
                parse_dates: !self.no_parse_dates,
                parse_numbers: !self.no_parse_numbers,
                parse_categories: !self.no_parse_categories,
                date_convention: if self.iso_dates {
                    DateConvention::Iso
                } else {
                    DateConvention::LocalEra
                },
                raw: self.raw,
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_base_url("base_url", &self.base_url)?;
            validation::validate_non_empty_string("endpoint", &self.endpoint)?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_output_formats("formats", &self.formats)?;
            if let Some(timeout) = self.timeout_seconds {
                validation::validate_positive_number("timeout_seconds", timeout, 1)?;
            }
            Ok(())
        }
    }

}
