use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// One flat JSON object as delivered by the open-data API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Raw text of a cell. JSON `null` and absent keys are both `None`;
    /// non-string scalars are read through their JSON text.
    pub fn raw_value(&self, column: &str) -> Option<String> {
        match self.data.get(column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            nested => Some(nested.to_string()),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDataset {
    pub records: Vec<Record>,
}

impl RawDataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of the record keys in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for record in &self.records {
            for key in record.data.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    pub fn column_values(&self, column: &str) -> Vec<Option<String>> {
        self.records.iter().map(|r| r.raw_value(column)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    Numeric,
    Categorical,
    #[serde(alias = "string")]
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Date => "date",
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(ColumnType::Date),
            "numeric" => Ok(ColumnType::Numeric),
            "categorical" => Ok(ColumnType::Categorical),
            "text" | "string" => Ok(ColumnType::Text),
            other => Err(format!(
                "unknown column type '{}' (expected date, numeric, categorical or text)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Date(Vec<Option<NaiveDate>>),
    Numeric(Vec<Option<f64>>),
    /// Dictionary encoded: `codes[i]` indexes into the sorted `categories`.
    Categorical {
        categories: Vec<String>,
        codes: Vec<Option<usize>>,
    },
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Date(_) => ColumnType::Date,
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::Categorical { .. } => ColumnType::Categorical,
            ColumnData::Text(_) => ColumnType::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Date(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnData::Date(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Numeric(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Categorical { codes, .. } => codes.get(row).map_or(true, Option::is_none),
            ColumnData::Text(v) => v.get(row).map_or(true, Option::is_none),
        }
    }

    pub fn non_null_count(&self) -> usize {
        (0..self.len()).filter(|&row| !self.is_null(row)).count()
    }

    /// Categorical label of a row, if this is a categorical column.
    pub fn category(&self, row: usize) -> Option<&str> {
        match self {
            ColumnData::Categorical { categories, codes } => codes
                .get(row)
                .copied()
                .flatten()
                .and_then(|code| categories.get(code))
                .map(String::as_str),
            _ => None,
        }
    }

    /// Display form of a cell; nulls render as `None`.
    pub fn display(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Date(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|d| d.format("%Y-%m-%d").to_string()),
            ColumnData::Numeric(v) => v.get(row).copied().flatten().map(|n| n.to_string()),
            ColumnData::Categorical { .. } => self.category(row).map(str::to_string),
            ColumnData::Text(v) => v.get(row).cloned().flatten(),
        }
    }

    pub fn json_value(&self, row: usize) -> Value {
        match self {
            ColumnData::Numeric(v) => v
                .get(row)
                .copied()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => self.display(row).map(Value::String).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedColumn {
    pub name: String,
    pub data: ColumnData,
}

impl TypedColumn {
    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub non_null: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedTable {
    row_count: usize,
    columns: Vec<TypedColumn>,
}

impl TypedTable {
    pub(crate) fn new(row_count: usize, columns: Vec<TypedColumn>) -> Self {
        debug_assert!(columns.iter().all(|c| c.data.len() == row_count));
        Self { row_count, columns }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(ColumnData::column_type)
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|c| ColumnSummary {
                name: c.name.clone(),
                column_type: c.column_type(),
                non_null: c.data.non_null_count(),
            })
            .collect()
    }

    pub fn head(&self, n: usize) -> Vec<Vec<Option<String>>> {
        (0..self.row_count.min(n))
            .map(|row| self.columns.iter().map(|c| c.data.display(row)).collect())
            .collect()
    }

    /// Rows as JSON objects keyed by column name, in column order.
    pub fn to_json_rows(&self) -> Vec<Map<String, Value>> {
        (0..self.row_count)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.data.json_value(row)))
                    .collect()
            })
            .collect()
    }
}

/// Output of the transform stage: the typed table plus its rendered forms.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: TypedTable,
    pub csv_output: Option<String>,
    pub tsv_output: Option<String>,
    pub json_output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_value_reads_scalars_as_text() {
        let record: Record = [
            ("code", json!("2330")),
            ("eps", json!(10.5)),
            ("listed", json!(true)),
            ("note", json!(null)),
        ]
        .into_iter()
        .collect();

        assert_eq!(record.raw_value("code").as_deref(), Some("2330"));
        assert_eq!(record.raw_value("eps").as_deref(), Some("10.5"));
        assert_eq!(record.raw_value("listed").as_deref(), Some("true"));
        assert_eq!(record.raw_value("note"), None);
        assert_eq!(record.raw_value("missing"), None);
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let dataset = RawDataset::new(vec![
            [("b", "1"), ("a", "2")].into_iter().collect(),
            [("a", "3"), ("c", "4")].into_iter().collect(),
        ]);

        assert_eq!(dataset.columns(), vec!["b", "a", "c"]);
        assert_eq!(
            dataset.column_values("c"),
            vec![None, Some("4".to_string())]
        );
    }

    #[test]
    fn test_column_type_parsing_accepts_string_alias() {
        assert_eq!("string".parse::<ColumnType>(), Ok(ColumnType::Text));
        assert_eq!("Categorical".parse::<ColumnType>(), Ok(ColumnType::Categorical));
        assert!("decimal".parse::<ColumnType>().is_err());

        let parsed: ColumnType = serde_json::from_value(json!("string")).unwrap();
        assert_eq!(parsed, ColumnType::Text);
    }

    #[test]
    fn test_categorical_display_and_json() {
        let data = ColumnData::Categorical {
            categories: vec!["半導體業".to_string(), "電子零組件業".to_string()],
            codes: vec![Some(1), None, Some(0)],
        };

        assert_eq!(data.display(0).as_deref(), Some("電子零組件業"));
        assert_eq!(data.json_value(1), Value::Null);
        assert_eq!(data.non_null_count(), 2);
    }
}
