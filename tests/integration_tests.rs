use clap::Parser;
use httpmock::prelude::*;
use std::io::Read;
use tempfile::TempDir;
use twse_etl::{CliConfig, ColumnData, ColumnType, EtlEngine, LocalStorage, TomlConfig, TwsePipeline};

fn eps_payload() -> serde_json::Value {
    serde_json::json!([
        {
            "出表日期": "1140115",
            "年度": "113",
            "季別": "4",
            "產業別": "半導體業",
            "公司代號": "2330",
            "公司名稱": "台積電",
            "基本每股盈餘(元)": "10.5"
        },
        {
            "出表日期": "1140115",
            "年度": "113",
            "季別": "4",
            "產業別": "其他電子業",
            "公司代號": "2317",
            "公司名稱": "鴻海",
            "基本每股盈餘(元)": "--"
        },
        {
            "出表日期": "1140115",
            "年度": "113",
            "季別": "4",
            "產業別": "半導體業",
            "公司代號": "2454",
            "公司名稱": "聯發科",
            "基本每股盈餘(元)": "1,001.25"
        }
    ])
}

fn read_entry(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_industry_eps() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/opendata/t187ap14_L");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(eps_payload());
    });

    let base_url = server.url("/v1/");
    let config = CliConfig::parse_from([
        "twse-etl",
        "--base-url",
        base_url.as_str(),
        "--output-path",
        output_path.as_str(),
    ]);

    let storage = LocalStorage::new(output_path.clone());
    let engine = EtlEngine::new(TwsePipeline::new(storage, config));
    let outcome = engine.run().await.unwrap();

    api_mock.assert();

    let table = &outcome.table;
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_type("出表日期"), Some(ColumnType::Date));
    assert_eq!(table.column_type("年度"), Some(ColumnType::Categorical));
    assert_eq!(table.column_type("季別"), Some(ColumnType::Categorical));
    assert_eq!(table.column_type("產業別"), Some(ColumnType::Categorical));
    assert_eq!(table.column_type("公司代號"), Some(ColumnType::Categorical));
    assert_eq!(table.column_type("公司名稱"), Some(ColumnType::Text));
    assert_eq!(
        table.column("基本每股盈餘(元)"),
        Some(&ColumnData::Numeric(vec![Some(10.5), None, Some(1001.25)]))
    );

    assert!(outcome.output_path.ends_with("twse_output.zip"));
    let full_path = temp_dir.path().join("twse_output.zip");
    assert!(full_path.exists());

    let zip_data = std::fs::read(&full_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 3);

    let csv_content = read_entry(&mut archive, "output.csv");
    let csv_lines: Vec<&str> = csv_content.lines().collect();
    assert_eq!(
        csv_lines[0],
        "出表日期,年度,季別,產業別,公司代號,公司名稱,基本每股盈餘(元)"
    );
    assert_eq!(csv_lines[1], "2025-01-15,113,4,半導體業,2330,台積電,10.5");
    assert_eq!(csv_lines[2], "2025-01-15,113,4,其他電子業,2317,鴻海,");

    let json_content = read_entry(&mut archive, "output.json");
    let rows: serde_json::Value = serde_json::from_str(&json_content).unwrap();
    assert_eq!(rows[2]["基本每股盈餘(元)"], serde_json::json!(1001.25));
    assert_eq!(rows[1]["基本每股盈餘(元)"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_end_to_end_with_api_failure() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/opendata/t187ap14_L");
        then.status(500);
    });

    let base_url = server.url("/v1/");
    let config = CliConfig::parse_from([
        "twse-etl",
        "--base-url",
        base_url.as_str(),
        "--output-path",
        output_path.as_str(),
        "--formats",
        "csv",
    ]);

    let storage = LocalStorage::new(output_path.clone());
    let engine = EtlEngine::new(TwsePipeline::new(storage, config));
    let outcome = engine.run().await.unwrap();

    api_mock.assert();
    assert!(outcome.table.is_empty());

    // still produces a (header-less) bundle rather than failing the run
    let zip_data = std::fs::read(temp_dir.path().join("twse_output.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(read_entry(&mut archive, "output.csv"), "");
}

#[tokio::test]
async fn test_end_to_end_with_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("eps");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/opendata/t187ap14_L");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(eps_payload());
    });

    let toml_content = format!(
        r#"
[source]
base_url = "{}"
timeout_seconds = 10

[transform]
parse_categories = false

[transform.column_types]
"基本每股盈餘(元)" = "text"

[load]
output_path = "{}"
output_formats = ["tsv"]
"#,
        server.url("/v1/"),
        output_path.display()
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();

    let storage = LocalStorage::new(output_path.clone());
    let engine = EtlEngine::new(TwsePipeline::new(storage, config));
    let outcome = engine.run().await.unwrap();

    api_mock.assert();

    let table = &outcome.table;
    // categorical columns fall back to text when category parsing is off
    assert_eq!(table.column_type("年度"), Some(ColumnType::Text));
    assert_eq!(table.column_type("產業別"), Some(ColumnType::Text));
    assert_eq!(table.column_type("出表日期"), Some(ColumnType::Date));
    assert_eq!(
        table.column("基本每股盈餘(元)"),
        Some(&ColumnData::Text(vec![
            Some("10.5".to_string()),
            None,
            Some("1,001.25".to_string())
        ]))
    );

    let zip_data = std::fs::read(output_path.join("twse_output.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 1);
    let tsv_content = read_entry(&mut archive, "output.tsv");
    assert!(tsv_content.starts_with("出表日期\t年度\t季別"));
}
