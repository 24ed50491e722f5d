//! Column type inference and coercion for flat open-data records.
//!
//! Normalization runs in two stages per column: [`infer_column_type`] picks
//! a [`ColumnType`] (unless the caller forces one) and [`convert_column`]
//! coerces every cell to it. Neither stage fails on bad data; a cell that
//! cannot be coerced becomes null.

use crate::core::dates::{is_local_era_shaped, parse_iso_date, parse_record_date};
use crate::domain::model::{ColumnData, ColumnType, RawDataset, TypedColumn, TypedTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Literal the upstream API uses for a missing value.
pub const MISSING_SENTINEL: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateConvention {
    /// `EEEMMDD`, era year + 1911.
    #[default]
    LocalEra,
    /// `YYYYMMDD`.
    Iso,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub parse_dates: bool,
    pub parse_numbers: bool,
    pub parse_categories: bool,
    pub date_convention: DateConvention,
    /// Skip inference and sentinel replacement; every column is kept as text.
    pub raw: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            parse_dates: true,
            parse_numbers: true,
            parse_categories: true,
            date_convention: DateConvention::LocalEra,
            raw: false,
        }
    }
}

impl NormalizeOptions {
    /// The type actually applied once the enable switches are honored.
    pub fn effective_type(&self, column_type: ColumnType) -> ColumnType {
        match column_type {
            ColumnType::Date if !self.parse_dates => ColumnType::Text,
            ColumnType::Numeric if !self.parse_numbers => ColumnType::Text,
            ColumnType::Categorical if !self.parse_categories => ColumnType::Text,
            other => other,
        }
    }
}

fn strip_sentinel(value: Option<String>) -> Option<String> {
    value.filter(|v| v != MISSING_SENTINEL)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Parse a number that may carry thousands separators (`"1,234.5"`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    cleaned.trim().parse().ok()
}

/// Infer the semantic type of one column. Never fails; falls back to
/// [`ColumnType::Categorical`].
pub fn infer_column_type(values: &[Option<String>], convention: DateConvention) -> ColumnType {
    let present: Vec<&str> = values
        .iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| *v != MISSING_SENTINEL)
        .collect();

    if convention == DateConvention::LocalEra && present.iter().all(|v| is_local_era_shaped(v)) {
        return ColumnType::Date;
    }

    if present
        .iter()
        .all(|v| is_blank(v) || parse_iso_date(v).is_some())
    {
        return ColumnType::Date;
    }

    if present
        .iter()
        .all(|v| is_blank(v) || parse_number(v).is_some())
    {
        return ColumnType::Numeric;
    }

    ColumnType::Categorical
}

fn parse_date(raw: &str, convention: DateConvention) -> Option<NaiveDate> {
    match convention {
        DateConvention::LocalEra => parse_record_date(raw),
        DateConvention::Iso => parse_iso_date(raw),
    }
}

/// Convention to convert an inferred date column with. A local-era column
/// that failed the 7-digit test was classified through the YYYYMMDD test.
fn inferred_date_convention(
    values: &[Option<String>],
    convention: DateConvention,
) -> DateConvention {
    let era_shaped = values.iter().flatten().all(|v| is_local_era_shaped(v));
    if convention == DateConvention::LocalEra && !era_shaped {
        DateConvention::Iso
    } else {
        convention
    }
}

/// Coerce a column to `column_type`. Cells that fail to convert are null.
pub fn convert_column(
    values: &[Option<String>],
    column_type: ColumnType,
    convention: DateConvention,
) -> ColumnData {
    let present = || values.iter().map(|v| strip_sentinel(v.clone()));

    match column_type {
        ColumnType::Date => ColumnData::Date(
            present()
                .map(|v| v.and_then(|s| parse_date(&s, convention)))
                .collect(),
        ),
        ColumnType::Numeric => ColumnData::Numeric(
            present()
                .map(|v| v.and_then(|s| parse_number(&s)))
                .collect(),
        ),
        ColumnType::Categorical => {
            let categories: Vec<String> = present()
                .flatten()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let codes = present()
                .map(|v| v.and_then(|s| categories.binary_search(&s).ok()))
                .collect();
            ColumnData::Categorical { categories, codes }
        }
        ColumnType::Text => ColumnData::Text(present().collect()),
    }
}

/// Normalize a raw dataset into a typed table.
///
/// `overrides` forces the type of the named columns; every other column is
/// inferred. Columns missing from some records are null in those rows.
pub fn normalize(
    dataset: &RawDataset,
    overrides: &HashMap<String, ColumnType>,
    options: &NormalizeOptions,
) -> TypedTable {
    let row_count = dataset.len();

    if options.raw {
        let columns = dataset
            .columns()
            .into_iter()
            .map(|name| {
                let data = ColumnData::Text(dataset.column_values(&name));
                TypedColumn { name, data }
            })
            .collect();
        return TypedTable::new(row_count, columns);
    }

    let cleaned: Vec<(String, Vec<Option<String>>)> = dataset
        .columns()
        .into_iter()
        .map(|name| {
            let values = dataset
                .column_values(&name)
                .into_iter()
                .map(strip_sentinel)
                .collect();
            (name, values)
        })
        .collect();

    let columns = cleaned
        .into_iter()
        .map(|(name, values)| {
            let (requested, convention) = match overrides.get(&name) {
                Some(forced) => (*forced, options.date_convention),
                None => (
                    infer_column_type(&values, options.date_convention),
                    inferred_date_convention(&values, options.date_convention),
                ),
            };
            let column_type = options.effective_type(requested);
            tracing::debug!(
                "Column '{}' -> {} (requested {}, forced: {})",
                name,
                column_type,
                requested,
                overrides.contains_key(&name)
            );
            let data = convert_column(&values, column_type, convention);
            TypedColumn { name, data }
        })
        .collect();

    TypedTable::new(row_count, columns)
}
