use crate::core::normalizer::{normalize, NormalizeOptions};
use crate::domain::model::{ColumnType, RawDataset, Record, TypedTable};
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openapi.twse.com.tw/v1/";

/// 上市公司各產業EPS統計資訊
pub const INDUSTRY_EPS_ENDPOINT: &str = "opendata/t187ap14_L";

/// Column types the industry EPS dataset is normalized with. Year, quarter
/// and company code look numeric but are labels.
pub fn industry_eps_column_types() -> HashMap<String, ColumnType> {
    HashMap::from([
        ("年度".to_string(), ColumnType::Categorical),
        ("季別".to_string(), ColumnType::Categorical),
        ("公司代號".to_string(), ColumnType::Categorical),
        ("公司名稱".to_string(), ColumnType::Text),
    ])
}

/// Thin client for the TWSE OpenAPI.
#[derive(Debug, Clone)]
pub struct TwseClient {
    base_url: String,
    timeout: Option<Duration>,
    client: Client,
}

impl Default for TwseClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TwseClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            client: Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// GET `{base_url}{endpoint}`.
    ///
    /// Returns `Ok(None)` and logs the status when the API answers with
    /// anything but 200. Transport and body decoding failures are errors.
    pub async fn fetch(&self, endpoint: &str) -> Result<Option<RawDataset>> {
        let url = self.url_for(endpoint);
        tracing::debug!("Making API request to: {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());

        if response.status() != StatusCode::OK {
            tracing::error!(
                "Error {} fetching data from {}.",
                response.status().as_u16(),
                url
            );
            return Ok(None);
        }

        let body: Value = response.json().await?;
        records_from_json(body).map(Some)
    }

    /// Fetch and normalize the industry EPS statistics dataset.
    pub async fn get_industry_eps_stat_info(
        &self,
        options: &NormalizeOptions,
    ) -> Result<Option<TypedTable>> {
        let dataset = self.fetch(INDUSTRY_EPS_ENDPOINT).await?;
        Ok(dataset.map(|d| normalize(&d, &industry_eps_column_types(), options)))
    }
}

/// Read an API body as records: an array of objects, or a single object.
pub fn records_from_json(body: Value) -> Result<RawDataset> {
    match body {
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<Record> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => Some(Record::new(obj)),
                    _ => None,
                })
                .collect();
            if records.len() < total {
                tracing::warn!(
                    "Skipped {} non-object items in API response",
                    total - records.len()
                );
            }
            Ok(RawDataset::new(records))
        }
        Value::Object(obj) => Ok(RawDataset::new(vec![Record::new(obj)])),
        other => Err(EtlError::ProcessingError {
            message: format!(
                "Expected a JSON array of objects, got {}",
                json_kind(&other)
            ),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ColumnData;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_successful_api_response() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/v1/opendata/t187ap14_L");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([
                    {"年度": "113", "公司代號": "2330"},
                    {"年度": "113", "公司代號": "2317"}
                ]));
        });

        let client = TwseClient::new(server.url("/v1/"));
        let dataset = client.fetch(INDUSTRY_EPS_ENDPOINT).await.unwrap().unwrap();

        api_mock.assert();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.columns(), vec!["年度", "公司代號"]);
        assert_eq!(dataset.records[1].raw_value("公司代號").as_deref(), Some("2317"));
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_absent() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/v1/opendata/t187ap14_L");
            then.status(503);
        });

        let client = TwseClient::new(server.url("/v1/"));
        let result = client.fetch(INDUSTRY_EPS_ENDPOINT).await.unwrap();

        api_mock.assert();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_industry_eps_stat_info_applies_forced_types() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/opendata/t187ap14_L");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([{
                    "出表日期": "1140115",
                    "年度": "113",
                    "季別": "4",
                    "產業別": "半導體業",
                    "公司代號": "2330",
                    "公司名稱": "台積電",
                    "基本每股盈餘(元)": "10.5"
                }]));
        });

        let client = TwseClient::new(server.url("/v1/"));
        let table = client
            .get_industry_eps_stat_info(&NormalizeOptions::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(table.column_type("出表日期"), Some(ColumnType::Date));
        assert_eq!(table.column_type("年度"), Some(ColumnType::Categorical));
        assert_eq!(table.column_type("季別"), Some(ColumnType::Categorical));
        assert_eq!(table.column_type("產業別"), Some(ColumnType::Categorical));
        assert_eq!(table.column_type("公司代號"), Some(ColumnType::Categorical));
        assert_eq!(table.column_type("公司名稱"), Some(ColumnType::Text));
        assert_eq!(
            table.column("基本每股盈餘(元)"),
            Some(&ColumnData::Numeric(vec![Some(10.5)]))
        );
    }

    #[test]
    fn test_records_from_single_object() {
        let dataset = records_from_json(json!({"年度": "113"})).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_records_from_scalar_is_error() {
        assert!(matches!(
            records_from_json(json!("maintenance")),
            Err(EtlError::ProcessingError { .. })
        ));
    }

    #[test]
    fn test_url_for_joins_base_and_endpoint() {
        let client = TwseClient::default();
        assert_eq!(
            client.url_for(INDUSTRY_EPS_ENDPOINT),
            "https://openapi.twse.com.tw/v1/opendata/t187ap14_L"
        );
    }
}
